// build.rs - TOML-driven compile-time limit generation
use std::env;
use std::fs;
use std::path::Path;

#[derive(serde::Deserialize)]
struct CompileTimeConfig {
    input: InputLimits,
    syntax: SyntaxLimits,
    operands: OperandLimits,
    references: ReferenceLimits,
    assembly: AssemblyLimits,
    logging: LoggingLimits,
}

#[derive(serde::Deserialize)]
struct InputLimits {
    max_input_length: usize,
}

#[derive(serde::Deserialize)]
struct SyntaxLimits {
    max_parse_depth: usize,
    max_identifier_length: usize,
    max_error_excerpt_length: usize,
}

#[derive(serde::Deserialize)]
struct OperandLimits {
    max_operand_nodes: usize,
    max_select_operands: usize,
}

#[derive(serde::Deserialize)]
struct ReferenceLimits {
    max_bindings: usize,
    max_alias_chain_depth: usize,
}

#[derive(serde::Deserialize)]
struct AssemblyLimits {
    max_elements: usize,
    max_cycle_path_length: usize,
}

#[derive(serde::Deserialize)]
struct LoggingLimits {
    max_log_message_length: usize,
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=EFC_BUILD_PROFILE");
    println!("cargo:rerun-if-env-changed=EFC_CONFIG_DIR");

    let profile = env::var("EFC_BUILD_PROFILE").unwrap_or_else(|_| "development".to_string());
    let config_dir = env::var("EFC_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

    // Find workspace root (parent of eventfilter_compiler directory)
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let workspace_root = Path::new(&manifest_dir)
        .parent()
        .expect("Could not find workspace root (parent directory)");

    let config_path = workspace_root
        .join(&config_dir)
        .join(format!("{}.toml", profile));

    println!("cargo:rerun-if-changed={}", config_path.display());

    if !config_path.exists() {
        panic!(
            "Configuration file not found: {}\nWorkspace root: {}\nLooking for: {}/{}/{}.toml",
            config_path.display(),
            workspace_root.display(),
            workspace_root.display(),
            config_dir,
            profile
        );
    }

    let config_content = fs::read_to_string(&config_path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", config_path.display(), e));

    let config: CompileTimeConfig = toml::from_str(&config_content)
        .unwrap_or_else(|e| panic!("Invalid TOML in {}: {}", config_path.display(), e));

    validate_security_constraints(&config, &profile);
    generate_constants(&config, &profile);
}

fn validate_security_constraints(config: &CompileTimeConfig, profile: &str) {
    const ABSOLUTE_MAX_INPUT_LENGTH: usize = 16 * 1024 * 1024;
    const ABSOLUTE_MAX_PARSE_DEPTH: usize = 512;
    const ABSOLUTE_MAX_OPERAND_NODES: usize = 10_000_000;

    let non_zero = [
        ("input.max_input_length", config.input.max_input_length),
        ("syntax.max_parse_depth", config.syntax.max_parse_depth),
        ("syntax.max_identifier_length", config.syntax.max_identifier_length),
        ("operands.max_operand_nodes", config.operands.max_operand_nodes),
        ("operands.max_select_operands", config.operands.max_select_operands),
        ("references.max_bindings", config.references.max_bindings),
        ("references.max_alias_chain_depth", config.references.max_alias_chain_depth),
        ("assembly.max_elements", config.assembly.max_elements),
        ("assembly.max_cycle_path_length", config.assembly.max_cycle_path_length),
    ];
    for (name, value) in non_zero {
        if value == 0 {
            panic!("SECURITY: {} must be greater than zero", name);
        }
    }

    if config.input.max_input_length > ABSOLUTE_MAX_INPUT_LENGTH {
        panic!("SECURITY: max_input_length exceeds absolute maximum");
    }

    // Recursive descent uses the native stack; keep nesting bounded
    if config.syntax.max_parse_depth > ABSOLUTE_MAX_PARSE_DEPTH {
        panic!("SECURITY: max_parse_depth exceeds absolute maximum");
    }

    if config.operands.max_operand_nodes > ABSOLUTE_MAX_OPERAND_NODES {
        panic!("SECURITY: max_operand_nodes exceeds absolute maximum");
    }

    if profile == "production" && config.input.max_input_length > 1024 * 1024 {
        panic!("PRODUCTION: max_input_length too high for production");
    }
}

fn generate_constants(config: &CompileTimeConfig, profile: &str) {
    let out_dir = env::var("OUT_DIR").unwrap();
    let output_path = Path::new(&out_dir).join("constants.rs");

    let constants_code = format!(
        r#"
// Generated compile-time constants from TOML configuration
// Profile: {}
// DO NOT EDIT - Generated by build.rs

pub mod compile_time {{
    pub mod input {{
        pub const MAX_INPUT_LENGTH: usize = {};
    }}

    pub mod syntax {{
        pub const MAX_PARSE_DEPTH: usize = {};
        pub const MAX_IDENTIFIER_LENGTH: usize = {};
        pub const MAX_ERROR_EXCERPT_LENGTH: usize = {};
    }}

    pub mod operands {{
        pub const MAX_OPERAND_NODES: usize = {};
        pub const MAX_SELECT_OPERANDS: usize = {};
    }}

    pub mod references {{
        pub const MAX_BINDINGS: usize = {};
        pub const MAX_ALIAS_CHAIN_DEPTH: usize = {};
    }}

    pub mod assembly {{
        pub const MAX_ELEMENTS: usize = {};
        pub const MAX_CYCLE_PATH_LENGTH: usize = {};
    }}

    pub mod logging {{
        pub const MAX_LOG_MESSAGE_LENGTH: usize = {};
    }}
}}
"#,
        profile,
        config.input.max_input_length,
        config.syntax.max_parse_depth,
        config.syntax.max_identifier_length,
        config.syntax.max_error_excerpt_length,
        config.operands.max_operand_nodes,
        config.operands.max_select_operands,
        config.references.max_bindings,
        config.references.max_alias_chain_depth,
        config.assembly.max_elements,
        config.assembly.max_cycle_path_length,
        config.logging.max_log_message_length,
    );

    fs::write(output_path, constants_code).unwrap();
}
