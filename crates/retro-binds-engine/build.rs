//! Generates the managed binding stubs into `OUT_DIR` and the native stubs
//! into `OUT_DIR/native`.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use retro_binds_codegen::{CONFIG_FILE_NAME, GenerateError, Generator, GeneratorConfig};

fn run() -> Result<(), GenerateError> {
    let manifest_dir = PathBuf::from(env::var_os("CARGO_MANIFEST_DIR").unwrap_or_default());
    let out_dir = PathBuf::from(env::var_os("OUT_DIR").unwrap_or_default());
    let src = manifest_dir.join("src");

    let mut config = GeneratorConfig::load_or_default(&manifest_dir.join(CONFIG_FILE_NAME))?;
    if let Some(bits) = env::var("CARGO_CFG_TARGET_POINTER_WIDTH")
        .ok()
        .and_then(|w| w.parse::<usize>().ok())
    {
        let arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();
        let os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
        config.set_cargo_target(bits, &arch, &os);
    }

    let output = Generator::new(config).generate_dir(&src, &src.join("interop"))?;
    output.write(&out_dir, &out_dir.join("native"))?;
    Ok(())
}

fn main() -> ExitCode {
    println!("cargo:rerun-if-changed=src/interop");
    println!("cargo:rerun-if-changed={CONFIG_FILE_NAME}");

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
