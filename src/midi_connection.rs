use lazy_static::lazy_static;
use midir::{MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use regex::Regex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;
use thiserror::Error;

const APP_NAME: &str = "Loop Grid Surface";
const POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("failed to initialize MIDI: {0}")]
    Init(String),

    #[error("invalid MIDI message: {0}")]
    InvalidMessage(&'static str),

    #[error("output thread is gone")]
    Disconnected
}

/// Anything raw MIDI bytes can be written to.
pub trait MidiSink {
    fn send (&mut self, message: &[u8]) -> Result<(), ConnectionError>;
    fn close (&mut self) {}
}

#[cfg(test)]
impl MidiSink for Vec<Vec<u8>> {
    fn send (&mut self, message: &[u8]) -> Result<(), ConnectionError> {
        self.push(message.to_vec());
        Ok(())
    }
}

enum SharedMidiOutputEvent {
    Send(Vec<u8>),
    Changed,
    Close
}

/// Output that follows a port by name, reconnecting as it comes and goes.
/// The last value per (status, id) is kept and replayed after a reconnect.
#[derive(Debug, Clone)]
pub struct SharedMidiOutputConnection {
    tx: mpsc::Sender<SharedMidiOutputEvent>,
    running: Arc<AtomicBool>
}

pub fn get_shared_output<F> (port_name: &str, on_switch: F) -> SharedMidiOutputConnection
where F: Fn() + Send + 'static {
    let (tx, rx) = mpsc::channel();
    let running = Arc::new(AtomicBool::new(true));

    // reconnect loop
    let tx_notify = tx.clone();
    let running_notify = running.clone();
    let port_name_notify = String::from(port_name);
    thread::spawn(move || {
        let mut last_available = false;
        while running_notify.load(Ordering::Relaxed) {
            let available = get_outputs().map(|ports| ports.contains(&normalize_port_name(&port_name_notify))).unwrap_or(false);
            if available != last_available {
                if tx_notify.send(SharedMidiOutputEvent::Changed).is_err() {
                    break
                }
                last_available = available;
            }
            thread::sleep(POLL_INTERVAL);
        }
    });

    // event loop
    let port_name_msg = String::from(port_name);
    let running_loop = running.clone();
    thread::spawn(move || {
        let mut current_output: Option<MidiOutputConnection> = None;
        let mut current_values: HashMap<(u8, u8), u8> = HashMap::new();
        for msg in rx {
            match msg {
                SharedMidiOutputEvent::Send(data) => send_and_save(&mut current_output, &mut current_values, &data),
                SharedMidiOutputEvent::Changed => {
                    if let Some(port) = current_output.take() {
                        port.close();
                    }
                    current_output = get_output(&port_name_msg);
                    if let Some(ref mut port) = current_output {
                        log::info!("connected to output {}", port_name_msg);
                        for (&(status, id), value) in &current_values {
                            if *value > 0 {
                                let _ = port.send(&[status, id, *value]);
                            }
                        }
                        on_switch();
                    } else {
                        log::info!("output {} unavailable", port_name_msg);
                    }
                },
                SharedMidiOutputEvent::Close => {
                    if let Some(port) = current_output.take() {
                        port.close();
                    }
                    running_loop.store(false, Ordering::Relaxed);
                    break
                }
            }
        }
    });

    SharedMidiOutputConnection { tx, running }
}

impl MidiSink for SharedMidiOutputConnection {
    fn send (&mut self, message: &[u8]) -> Result<(), ConnectionError> {
        validate_message(message)?;
        self.tx.send(SharedMidiOutputEvent::Send(message.to_vec())).map_err(|_| ConnectionError::Disconnected)
    }

    /// Safe to call after the port already went away.
    fn close (&mut self) {
        if self.running.load(Ordering::Relaxed) {
            let _ = self.tx.send(SharedMidiOutputEvent::Close);
        }
    }
}

fn send_and_save (output: &mut Option<MidiOutputConnection>, save_dest: &mut HashMap<(u8, u8), u8>, message: &[u8]) {
    if let Some(port) = output {
        if let Err(err) = port.send(message) {
            log::warn!("MIDI send failed: {}", err);
        }
    }
    if message.len() == 3 {
        save_dest.insert((message[0], message[1]), message[2]);
    }
}

fn validate_message (message: &[u8]) -> Result<(), ConnectionError> {
    match message.first() {
        None => Err(ConnectionError::InvalidMessage("message to be sent must not be empty")),
        Some(&0xF0) => Ok(()),
        Some(_) if message.len() > 3 => Err(ConnectionError::InvalidMessage("non-sysex message must not be longer than 3 bytes")),
        Some(_) => Ok(())
    }
}

/// Keeps the threads behind an input or watcher alive; stops them when dropped.
pub struct ThreadReference {
    running: Arc<AtomicBool>
}

impl Drop for ThreadReference {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
    }
}

pub fn get_input<F> (port_name: &str, callback: F) -> ThreadReference
where F: FnMut(u64, &[u8]) + Send + 'static {
    let running = Arc::new(AtomicBool::new(true));
    let port_name_notify = String::from(port_name);
    let (tx, rx) = mpsc::channel::<(u64, Vec<u8>)>();

    thread::spawn(move || {
        let mut callback = callback;
        for (stamp, data) in rx {
            callback(stamp, &data)
        }
    });

    let running_poll = running.clone();
    thread::spawn(move || {
        let mut current_input: Option<MidiInputConnection<()>> = None;
        while running_poll.load(Ordering::Relaxed) {
            if current_input.is_none() {
                current_input = connect_input(&port_name_notify, tx.clone());
                if current_input.is_some() {
                    log::info!("connected to input {}", port_name_notify);
                }
            } else if !get_inputs().map(|ports| ports.contains(&normalize_port_name(&port_name_notify))).unwrap_or(false) {
                log::info!("input {} went away", port_name_notify);
                if let Some(input) = current_input.take() {
                    input.close();
                }
            }
            thread::sleep(POLL_INTERVAL);
        }
        if let Some(input) = current_input {
            input.close();
        }
    });

    ThreadReference { running }
}

fn connect_input (port_name: &str, tx: mpsc::Sender<(u64, Vec<u8>)>) -> Option<MidiInputConnection<()>> {
    let input = MidiInput::new(APP_NAME).ok()?;
    let normalized_name = normalize_port_name(port_name);
    let port = input.ports().into_iter().find(|port| {
        input.port_name(port).map(|name| normalize_port_name(&name) == normalized_name).unwrap_or(false)
    })?;
    input.connect(&port, port_name, move |stamp, message, _| {
        let _ = tx.send((stamp, Vec::from(message)));
    }, ()).ok()
}

pub fn get_output (port_name: &str) -> Option<MidiOutputConnection> {
    let output = MidiOutput::new(APP_NAME).ok()?;
    let normalized_name = normalize_port_name(port_name);
    let port = output.ports().into_iter().find(|port| {
        output.port_name(port).map(|name| normalize_port_name(&name) == normalized_name).unwrap_or(false)
    })?;
    output.connect(&port, port_name).ok()
}

pub fn get_outputs () -> Result<Vec<String>, ConnectionError> {
    let output = MidiOutput::new(APP_NAME).map_err(|err| ConnectionError::Init(err.to_string()))?;
    Ok(output.ports().iter().filter_map(|port| output.port_name(port).ok()).map(|name| normalize_port_name(&name)).collect())
}

pub fn get_inputs () -> Result<Vec<String>, ConnectionError> {
    let input = MidiInput::new(APP_NAME).map_err(|err| ConnectionError::Init(err.to_string()))?;
    Ok(input.ports().iter().filter_map(|port| input.port_name(port).ok()).map(|name| normalize_port_name(&name)).collect())
}

/// Calls back with the output port list whenever it changes.
pub fn watch_outputs<F> (callback: F) -> ThreadReference
where F: Fn(Vec<String>) + Send + 'static {
    let running = Arc::new(AtomicBool::new(true));
    let running_poll = running.clone();
    thread::spawn(move || {
        let mut last_ports = None;
        while running_poll.load(Ordering::Relaxed) {
            match get_outputs() {
                Ok(ports) => {
                    if last_ports.as_ref() != Some(&ports) {
                        callback(ports.clone());
                        last_ports = Some(ports);
                    }
                },
                Err(err) => log::warn!("could not list outputs: {}", err)
            }
            thread::sleep(POLL_INTERVAL);
        }
    });
    ThreadReference { running }
}

pub fn normalize_port_name (name: &str) -> String {
    lazy_static! {
        static ref RE: Regex = Regex::new(r"^([0-9]- )?(.+?)( [0-9]+:[0-9]+)?$").unwrap();
    }
    RE.replace(name, "${2}").into_owned()
}
