//! The realtime service: audio output, socket IPC, command and report
//! threads.
//!
//! Three logical threads around the shared engine: the audio backend pulls
//! render passes on its own thread, a command thread drains the bounded
//! queue fed by the socket reader, and the main thread ticks reports to
//! the IPC peer at ~60 Hz. Shutdown order: cancel, close the command
//! queue, then drop the audio stream.

use cantus_engine::{protocol, run_command_loop, Engine};
use cantus_engine::{CHANGE_ALL_PARAMS, CHANGE_DATA, CHANGE_FILTER_SHAPE, CHANGE_PRESET_LIST};
use cantus_io::{AudioBackend, CpalBackend, StreamConfig, StreamHandle};
use clap::Args;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Args)]
pub struct ServeArgs {
    /// Unix socket path for the IPC peer
    #[arg(long, default_value = "/tmp/cantus.sock")]
    socket: PathBuf,

    /// Preset directory
    #[arg(long, default_value = "presets")]
    preset_dir: PathBuf,

    /// Directory holding the precomputed wavetable files
    #[arg(long, default_value = "wavetables")]
    wavetable_dir: PathBuf,

    /// Output device name filter (system default when omitted)
    #[arg(long)]
    device: Option<String>,

    /// Audio buffer size in frames
    #[arg(long, default_value_t = cantus_core::SAMPLES_PER_CYCLE as u32)]
    buffer_size: u32,
}

pub fn run(args: ServeArgs) -> anyhow::Result<()> {
    let tables = super::load_wavetables(&args.wavetable_dir);
    let engine = Arc::new(Engine::new(tables, &args.preset_dir));
    engine.restore_session();

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || {
            tracing::info!("shutting down");
            running.store(false, Ordering::SeqCst);
        })?;
    }

    // Bounded command queue between the socket reader and the command
    // thread.
    let (tx, rx) = crossbeam_channel::bounded::<Vec<String>>(256);
    let command_thread = {
        let engine = Arc::clone(&engine);
        std::thread::spawn(move || run_command_loop(engine, rx))
    };

    let _stream = start_audio(&args, &engine, &running)?;

    let result = serve_ipc(&args, &engine, &running, tx);

    engine.save_session();
    // The command queue sender is consumed by serve_ipc; once every clone
    // is gone the command thread drains and exits.
    command_thread
        .join()
        .map_err(|_| anyhow::anyhow!("command thread panicked"))?;
    std::fs::remove_file(&args.socket).ok();
    result
}

fn start_audio(
    args: &ServeArgs,
    engine: &Arc<Engine>,
    running: &Arc<AtomicBool>,
) -> anyhow::Result<StreamHandle> {
    let backend = CpalBackend::new();
    let config = StreamConfig {
        buffer_size: args.buffer_size,
        device_name: args.device.clone(),
        ..StreamConfig::default()
    };
    let render_engine = Arc::clone(engine);
    let error_running = Arc::clone(running);
    let stream = backend.build_output_stream(
        &config,
        Box::new(move |buf| render_engine.render(buf)),
        Box::new(move |err| {
            // A dead device cannot be rendered to; tear the service down.
            tracing::error!(error = err, "audio device failed");
            error_running.store(false, Ordering::SeqCst);
        }),
    )?;
    Ok(stream)
}

fn serve_ipc(
    args: &ServeArgs,
    engine: &Arc<Engine>,
    running: &Arc<AtomicBool>,
    tx: crossbeam_channel::Sender<Vec<String>>,
) -> anyhow::Result<()> {
    std::fs::remove_file(&args.socket).ok();
    let listener = UnixListener::bind(&args.socket)?;
    listener.set_nonblocking(true)?;
    tracing::info!(socket = %args.socket.display(), "listening for IPC peer");

    let conn = loop {
        if !running.load(Ordering::SeqCst) {
            return Ok(());
        }
        match listener.accept() {
            Ok((conn, _)) => break conn,
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(Duration::from_millis(50));
            }
            Err(e) => return Err(e.into()),
        }
    };
    conn.set_nonblocking(false)?;
    tracing::info!("IPC peer connected");

    // Socket reader feeds the command queue on its own thread.
    let reader_conn = conn.try_clone()?;
    let reader_thread = {
        let engine = Arc::clone(engine);
        let running = Arc::clone(running);
        std::thread::spawn(move || read_commands(reader_conn, engine, running, tx))
    };

    report_loop(conn, engine, running);
    reader_thread
        .join()
        .map_err(|_| anyhow::anyhow!("socket reader panicked"))?;
    Ok(())
}

fn read_commands(
    conn: UnixStream,
    engine: Arc<Engine>,
    running: Arc<AtomicBool>,
    tx: crossbeam_channel::Sender<Vec<String>>,
) {
    conn.set_read_timeout(Some(Duration::from_millis(100))).ok();
    let mut reader = BufReader::new(conn);
    let mut line = String::new();
    loop {
        if !running.load(Ordering::SeqCst) {
            break;
        }
        match reader.read_line(&mut line) {
            Ok(0) => {
                tracing::info!("IPC peer disconnected");
                running.store(false, Ordering::SeqCst);
                break;
            }
            Ok(_) => {
                let trimmed = line.trim_end_matches(['\r', '\n']);
                if !trimmed.is_empty() {
                    match protocol::parse_command_line(trimmed) {
                        Ok(command) => {
                            tracing::debug!(?command, "received command");
                            if tx.send(command).is_err() {
                                break;
                            }
                        }
                        Err(e) => engine.changes().push_error(e.to_string()),
                    }
                }
                line.clear();
            }
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                continue;
            }
            Err(e) => {
                tracing::warn!(error = %e, "socket read failed");
                running.store(false, Ordering::SeqCst);
                break;
            }
        }
    }
}

/// Tick reports to the peer at ~60 Hz until shutdown.
fn report_loop(mut conn: UnixStream, engine: &Arc<Engine>, running: &Arc<AtomicBool>) {
    let tick = Duration::from_micros(1_000_000 / 60);
    let changes = engine.changes();
    let mut send = |conn: &mut UnixStream, line: String| -> bool {
        conn.write_all(line.as_bytes()).is_ok() && conn.write_all(b"\n").is_ok()
    };

    while running.load(Ordering::SeqCst) {
        std::thread::sleep(tick);

        let mut lines = vec![protocol::format_fft(&engine.spectrum())];
        lines.push(protocol::format_status(&engine.status_json()));
        if changes.take(CHANGE_FILTER_SHAPE) {
            lines.push(protocol::format_filter_shape(&engine.filter_shape()));
        }
        if changes.take(CHANGE_DATA) | changes.take(CHANGE_ALL_PARAMS) {
            lines.push(protocol::format_all_params(&engine.params_json()));
        }
        if changes.take(CHANGE_PRESET_LIST) {
            match engine.preset_list_json() {
                Ok(json) => lines.push(protocol::format_preset_list(&json)),
                Err(e) => changes.push_error(e.to_string()),
            }
        }
        for message in changes.drain_errors() {
            lines.push(protocol::format_error(&message));
        }

        for line in lines {
            if !send(&mut conn, line) {
                tracing::warn!("report write failed, stopping");
                running.store(false, Ordering::SeqCst);
                return;
            }
        }
    }
}
