//! A controller that lives in memory, for driving the plotter without hardware.

use std::{
    cell::RefCell,
    collections::{HashMap, VecDeque},
    io::{self, ErrorKind, Read, Write},
    rc::Rc,
};

/// What the simulated controller has been told and has yet to say.
#[derive(Default)]
pub struct ControllerState {
    /// Bytes of a command that has not been terminated yet.
    unparsed: Vec<u8>,
    /// Bytes waiting to be read.
    replies: VecDeque<u8>,
    /// Every complete command received, without the terminating `;`.
    pub commands: Vec<String>,
    /// Last target of each stepper.
    pub steppers: HashMap<u8, i64>,
    /// Last pulse width of each servo, keyed by command letter and pin.
    pub servos: HashMap<(char, u8), i64>,
    /// How many "still moving" answers each move gets.
    pub busy_polls: usize,
    /// "Still moving" answers left for the current move.
    busy_left: usize,
}

impl ControllerState {
    /// Carries out a single command.
    fn handle(&mut self, command: &str) {
        self.commands.push(command.to_string());

        let mut chars = command.chars();
        let Some(letter) = chars.next() else {
            return;
        };
        let rest = chars.as_str();

        if let Some(index) = rest.strip_suffix('?') {
            let index: u8 = index.parse().unwrap();
            let finished = if self.busy_left > 0 {
                self.busy_left -= 1;
                0
            } else {
                1
            };
            self.replies.extend(b"ok\r\n");
            self.replies
                .extend(format!("i{index}={finished}\r\n").as_bytes());
            return;
        }

        let (index, value) = rest.split_once('=').unwrap();
        let index: u8 = index.parse().unwrap();
        let value: i64 = value.parse().unwrap();
        match letter {
            't' => {
                self.steppers.insert(index, value);
                self.busy_left = self.busy_polls;
            }
            's' | 'l' => {
                self.servos.insert((letter, index), value);
            }
            other => panic!("unknown command letter {other}"),
        }
    }

    /// Gets the commands that start with a letter.
    pub fn commands_for(&self, letter: char) -> Vec<&str> {
        self.commands
            .iter()
            .filter(|command| command.starts_with(letter))
            .map(String::as_str)
            .collect()
    }
}

/// A transport to a simulated controller. Clones share the same controller.
#[derive(Clone, Default)]
pub struct SimulatedController {
    /// The controller.
    pub state: Rc<RefCell<ControllerState>>,
}

impl SimulatedController {
    /// Creates a controller whose motors take `busy_polls` polls to finish each move.
    pub fn new(busy_polls: usize) -> Self {
        let controller = SimulatedController::default();
        controller.state.borrow_mut().busy_polls = busy_polls;
        controller
    }
}

impl Read for SimulatedController {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.borrow_mut();
        if state.replies.is_empty() {
            return Err(io::Error::new(ErrorKind::TimedOut, "timed out"));
        }

        let count = buf.len().min(state.replies.len());
        for (slot, byte) in buf.iter_mut().zip(state.replies.drain(..count)) {
            *slot = byte;
        }
        Ok(count)
    }
}

impl Write for SimulatedController {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.borrow_mut();
        for byte in buf {
            if *byte == b';' {
                let command = String::from_utf8(std::mem::take(&mut state.unparsed)).unwrap();
                state.handle(&command);
            } else {
                state.unparsed.push(*byte);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
