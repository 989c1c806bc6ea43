// This is free and unencumbered software released into the public domain.

#[cfg(not(feature = "std"))]
compile_error!("camera2-methods requires the 'std' feature");

use asimov_module::SysexitsError::{self, *};
use camera2_plugin::shared::{Method, PLUGIN_NAME};
use clap::Parser;
use clientele::StandardOptions;
use serde_json::json;
use std::error::Error as StdError;

/// Lists the methods of the Camera2 plugin contract.
#[derive(Debug, Parser)]
struct Options {
    #[clap(flatten)]
    flags: StandardOptions,

    #[arg(
        value_name = "FORMAT",
        short = 'o',
        long = "output",
        value_enum,
        default_value = "text"
    )]
    output: OutputFormat,
}

#[derive(Debug, Clone, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Jsonl,
}

pub fn main() -> Result<SysexitsError, Box<dyn StdError>> {
    asimov_module::dotenv().ok();
    let args = asimov_module::args_os()?;
    let options = Options::parse_from(args);

    if options.flags.version {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return Ok(EX_OK);
    }

    if options.flags.license {
        print!("{}", include_str!("../../UNLICENSE"));
        return Ok(EX_OK);
    }

    #[cfg(feature = "tracing")]
    asimov_module::init_tracing_subscriber(&options.flags).expect("failed to initialize logging");

    list_methods(&options);
    Ok(EX_OK)
}

fn list_methods(options: &Options) {
    if options.flags.debug || options.flags.verbose >= 1 {
        eprintln!("INFO: listing {PLUGIN_NAME} methods");
    }

    for method in Method::ALL {
        match options.output {
            OutputFormat::Text => {
                if method.requires_session() {
                    println!("{method}: {} [session]", method.returns());
                } else {
                    println!("{method}: {}", method.returns());
                }
            },
            OutputFormat::Jsonl => {
                println!(
                    "{}",
                    json!({
                        "plugin": PLUGIN_NAME,
                        "method": method.to_string(),
                        "returns": method.returns(),
                        "session": method.requires_session(),
                    })
                );
            },
        }
    }
}
