use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use ssh2::Session;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const OPERATION_TIMEOUT: Duration = Duration::from_secs(30);
const RESIZE_POLL: Duration = Duration::from_millis(250);
const INPUT_POLL: Duration = Duration::from_millis(30);

pub(crate) fn connect_session(host: &str, port: u16, user: &str, password: &str) -> Result<Session> {
    let address = format!("{host}:{port}");
    let mut last_err = None;
    let mut tcp = None;
    for addr in address
        .to_socket_addrs()
        .with_context(|| format!("resolve {address}"))?
    {
        match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
            Ok(stream) => {
                tcp = Some(stream);
                break;
            }
            Err(err) => last_err = Some(err),
        }
    }
    let tcp = tcp.ok_or_else(|| {
        let err = last_err.unwrap_or_else(|| io::Error::other("no address resolved"));
        anyhow::anyhow!("connect to {address} failed: {err}")
    })?;

    let mut session = Session::new().context("create session")?;
    session.set_timeout(CONNECT_TIMEOUT.as_millis() as u32);
    session.set_tcp_stream(tcp);
    session.handshake().context("ssh handshake")?;
    session
        .userauth_password(user, password)
        .context("password auth")?;
    if !session.authenticated() {
        anyhow::bail!("Authentication failed");
    }
    session.set_timeout(OPERATION_TIMEOUT.as_millis() as u32);
    Ok(session)
}

pub(crate) fn run_ssh_terminal(session: &Session) -> Result<()> {
    let (cols, rows) = crossterm::terminal::size().unwrap_or((80, 24));
    let mut channel = session.channel_session().context("open channel")?;
    channel
        .request_pty("xterm", None, Some((u32::from(cols), u32::from(rows), 0, 0)))
        .context("request pty")?;
    channel.shell().context("start shell")?;

    let mut stdout = io::stdout();
    writeln!(stdout, "Connected. Press Ctrl+g to return to the client.").ok();
    stdout.flush().ok();

    enable_raw_mode().context("enable raw mode")?;
    session.set_blocking(false);
    let (resize_rx, stop) = spawn_resize_listener((cols, rows));
    let result = pump_channel(&mut channel, &resize_rx);
    stop.store(true, Ordering::SeqCst);
    session.set_blocking(true);
    disable_raw_mode().ok();
    channel.close().ok();
    result
}

fn pump_channel(channel: &mut ssh2::Channel, resize_rx: &mpsc::Receiver<(u16, u16)>) -> Result<()> {
    let mut stdout = io::stdout();
    let mut buffer = [0u8; 4096];
    let mut err_buffer = [0u8; 1024];

    loop {
        if channel.eof() {
            return Ok(());
        }

        match channel.read(&mut buffer) {
            Ok(0) => {}
            Ok(count) => {
                stdout.write_all(&buffer[..count]).ok();
                stdout.flush().ok();
            }
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {}
            Err(err) => return Err(err).context("read channel"),
        }

        match channel.stderr().read(&mut err_buffer) {
            Ok(0) => {}
            Ok(count) => {
                stdout.write_all(&err_buffer[..count]).ok();
                stdout.flush().ok();
            }
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {}
            Err(err) => return Err(err).context("read stderr"),
        }

        while let Ok((cols, rows)) = resize_rx.try_recv() {
            let _ = channel.request_pty_size(u32::from(cols), u32::from(rows), None, None);
        }

        if event::poll(INPUT_POLL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.modifiers.contains(KeyModifiers::CONTROL)
                    && matches!(key.code, KeyCode::Char('g'))
                {
                    return Ok(());
                }
                if let Some(bytes) = key_to_bytes(key) {
                    channel.write_all(&bytes).ok();
                    channel.flush().ok();
                }
            }
        }
    }
}

fn spawn_resize_listener(initial: (u16, u16)) -> (mpsc::Receiver<(u16, u16)>, Arc<AtomicBool>) {
    let (tx, rx) = mpsc::channel();
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = Arc::clone(&stop);
    thread::spawn(move || {
        let mut last = initial;
        while !stop_flag.load(Ordering::SeqCst) {
            thread::sleep(RESIZE_POLL);
            let Ok(size) = crossterm::terminal::size() else {
                continue;
            };
            if size != last {
                last = size;
                if tx.send(size).is_err() {
                    break;
                }
            }
        }
    });
    (rx, stop)
}

fn key_to_bytes(key: KeyEvent) -> Option<Vec<u8>> {
    match key.code {
        KeyCode::Char(c) => {
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                Some(vec![(c as u8) & 0x1f])
            } else if key.modifiers.contains(KeyModifiers::ALT) {
                let mut bytes = vec![0x1b];
                bytes.extend(c.to_string().into_bytes());
                Some(bytes)
            } else {
                Some(c.to_string().into_bytes())
            }
        }
        KeyCode::Enter => Some(vec![b'\r']),
        KeyCode::Backspace => Some(vec![0x7f]),
        KeyCode::Tab => Some(vec![b'\t']),
        KeyCode::BackTab => Some(b"\x1b[Z".to_vec()),
        KeyCode::Esc => Some(vec![0x1b]),
        KeyCode::Up => Some(b"\x1b[A".to_vec()),
        KeyCode::Down => Some(b"\x1b[B".to_vec()),
        KeyCode::Right => Some(b"\x1b[C".to_vec()),
        KeyCode::Left => Some(b"\x1b[D".to_vec()),
        KeyCode::Home => Some(b"\x1b[H".to_vec()),
        KeyCode::End => Some(b"\x1b[F".to_vec()),
        KeyCode::Delete => Some(b"\x1b[3~".to_vec()),
        KeyCode::Insert => Some(b"\x1b[2~".to_vec()),
        KeyCode::PageUp => Some(b"\x1b[5~".to_vec()),
        KeyCode::PageDown => Some(b"\x1b[6~".to_vec()),
        _ => None,
    }
}
