// This is free and unencumbered software released into the public domain.

#[cfg(not(feature = "std"))]
compile_error!("camera2-bridge requires the 'std' feature");

use asimov_module::SysexitsError::{self, *};
use camera2_plugin::{
    cli::{self, info_user, warn_user},
    shared::{Bridge, CameraBackend, CameraError, PluginConfig, Request, Response},
};
use clap::Parser;
use clientele::StandardOptions;
use serde::Deserialize;
use serde_json::Value;
use std::{
    error::Error as StdError,
    io::{self, BufRead, Write},
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::{self, RecvTimeoutError},
    },
    time::Duration,
};

/// Runs the Camera2 plugin and answers calls given as JSON lines on stdin,
/// or a single call given with `--call`.
#[derive(Debug, Parser)]
struct Options {
    #[clap(flatten)]
    flags: StandardOptions,

    /// Camera backend: android, ffmpeg or synthetic.
    #[arg(long)]
    backend: Option<CameraBackend>,

    #[arg(long)]
    device: Option<String>,

    /// Capture resolution.
    #[arg(short, long = "size", value_parser = parse_dimensions)]
    size: Option<(u32, u32)>,

    /// Directory that relative picture paths resolve against.
    #[arg(long)]
    storage_root: Option<PathBuf>,

    /// Invoke one method and exit.
    #[arg(long, value_name = "METHOD")]
    call: Option<String>,

    /// Options object for `--call`.
    #[arg(long, value_name = "JSON", requires = "call")]
    options: Option<String>,
}

/// One line of input: a request with an optional correlation id.
#[derive(Debug, Deserialize)]
struct Line {
    #[serde(default)]
    id: Option<Value>,
    #[serde(flatten)]
    request: Request,
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

    let exit_code = match run_bridge(&options) {
        Ok(code) => code,
        Err(err) => cli::handle_error(&err, &options.flags),
    };

    Ok(exit_code)
}

fn plugin_config(opts: &Options) -> Result<PluginConfig, CameraError> {
    let mut config = PluginConfig::from_env()?;
    if let Some(backend) = opts.backend {
        config = config.with_backend(backend);
    }
    if let Some(device) = &opts.device {
        config = config.with_device(device.clone());
    }
    if let Some((width, height)) = opts.size {
        config.width = width;
        config.height = height;
    }
    if let Some(root) = &opts.storage_root {
        config = config.with_storage_root(root.clone());
    }
    let diagnostics = config.diagnostics || opts.flags.debug || opts.flags.verbose >= 3;
    Ok(config.with_diagnostics(diagnostics))
}

fn run_bridge(opts: &Options) -> Result<SysexitsError, CameraError> {
    let config = plugin_config(opts)?;
    let bridge = Bridge::open(&config);

    if let Some(method) = &opts.call {
        let options = match &opts.options {
            Some(json) => serde_json::from_str(json).map_err(|e| {
                CameraError::invalid_config(format!("--options is not valid JSON: {e}"))
            })?,
            None => Value::Null,
        };
        let response = bridge.handle(Request::new(method.clone(), options));
        println!("{}", serde_json::to_string(&response).unwrap_or_default());
        return Ok(match response.error_kind() {
            None => EX_OK,
            Some(kind) => cli::exit_code(kind),
        });
    }

    info_user(&opts.flags, "reading calls from stdin");

    let quit = Arc::new(AtomicBool::new(false));
    {
        let quit2 = Arc::clone(&quit);
        ctrlc::set_handler(move || {
            quit2.store(true, Ordering::SeqCst);
        })
        .map_err(|e| CameraError::unavailable_with("cannot install the Ctrl-C handler", e))?;
    }

    let (tx, rx) = mpsc::channel::<io::Result<String>>();
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    while !quit.load(Ordering::SeqCst) {
        let line = match rx.recv_timeout(Duration::from_millis(50)) {
            Ok(Ok(line)) => line,
            Ok(Err(err)) => {
                warn_user(&opts.flags, &format!("cannot read stdin: {err}"));
                break;
            },
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let reply = answer(&bridge, &line);
        let mut out = io::stdout().lock();
        if let Err(err) = writeln!(&mut out, "{reply}").and_then(|()| out.flush()) {
            if err.kind() == io::ErrorKind::BrokenPipe {
                break;
            }
            warn_user(&opts.flags, &format!("cannot write response: {err}"));
        }
    }

    info_user(&opts.flags, "releasing camera");
    drop(bridge);
    Ok(EX_OK)
}

fn answer(bridge: &Bridge, line: &str) -> Value {
    let (id, response) = match serde_json::from_str::<Line>(line) {
        Ok(Line { id, request }) => {
            let method = request.method.clone();
            let response = bridge.handle(request);
            tracing::debug!(%method, resolved = response.is_resolved(), "answered call");
            (id, response)
        },
        Err(err) => (
            None,
            Response::from_result(
                "",
                Err(CameraError::invalid_config(format!("malformed request: {err}"))),
            ),
        ),
    };

    let mut reply = serde_json::to_value(&response).unwrap_or_default();
    if let (Some(id), Some(object)) = (id, reply.as_object_mut()) {
        object.insert("id".into(), id);
    }
    reply
}

fn parse_dimensions(s: &str) -> Result<(u32, u32), String> {
    let s = s.trim().replace('×', "x");
    let parts: Vec<&str> = s.split('x').map(|t| t.trim()).collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(format!("Invalid format '{s}'. Use WxH (e.g., 1920x1080)"));
    }

    let width: u32 = parts[0]
        .parse()
        .map_err(|_| format!("Invalid width: {}", parts[0]))?;
    let height: u32 = parts[1]
        .parse()
        .map_err(|_| format!("Invalid height: {}", parts[1]))?;

    if !(16..=7680).contains(&width) {
        return Err(format!("Width {width} is out of reasonable range (16-7680)"));
    }
    if !(16..=4320).contains(&height) {
        return Err(format!("Height {height} is out of reasonable range (16-4320)"));
    }

    Ok((width, height))
}
