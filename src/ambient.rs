// src/ambient.rs
use std::io::{Read, Write};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use serialport::{ClearBuffer, SerialPort};

const BAUD_RATE: u32 = 9600;
// Opening the port resets the board.
const RESET_DELAY: Duration = Duration::from_secs(2);

/// Latest values reported by the ambient controller.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AmbientReading {
    pub temp: Option<f64>,
    pub hold: Option<f64>,
    pub pwm: Option<f64>,
}
/// Arduino-based ambient controller on a serial port.
///
/// Prints lines like `TEMP:25.30,HOLD:53.60,PWM:255` (or a bare temperature)
/// and accepts `SET:25.00` to change the hold temperature.
pub struct AmbientController {
    port: Box<dyn SerialPort>,
    pending: String,
    latest: AmbientReading,
}
impl AmbientController {
    pub fn open(port_name: &str) -> Result<Self> {
        let port_name = normalize_port(port_name);
        let port = serialport::new(&port_name, BAUD_RATE)
            .timeout(Duration::from_millis(100))
            .open()
            .with_context(|| format!("failed to open ambient controller on {port_name}"))?;
        thread::sleep(RESET_DELAY);
        port.clear(ClearBuffer::Input)
            .context("failed to clear serial input buffer")?;
        log::info!("ambient controller connected on {port_name}");
        Ok(Self {
            port,
            pending: String::new(),
            latest: AmbientReading::default(),
        })
    }
    pub fn set_hold(&mut self, temp_c: f64) -> Result<()> {
        let cmd = format!("SET:{temp_c:.2}\n");
        self.port
            .write_all(cmd.as_bytes())
            .context("failed to send hold temperature")?;
        Ok(())
    }
    /// Drains pending serial input and returns the most recent values. Read
    /// failures and malformed lines keep the last good values.
    pub fn poll(&mut self) -> AmbientReading {
        let available = match self.port.bytes_to_read() {
            Ok(n) => n as usize,
            Err(err) => {
                log::debug!("ambient bytes_to_read failed: {err}");
                return self.latest;
            }
        };
        if available == 0 {
            return self.latest;
        }
        let mut buf = vec![0u8; available];
        match self.port.read(&mut buf) {
            Ok(n) => self.pending.push_str(&String::from_utf8_lossy(&buf[..n])),
            Err(err) => {
                log::debug!("ambient read failed: {err}");
                return self.latest;
            }
        }
        while let Some(pos) = self.pending.find('\n') {
            let line: String = self.pending.drain(..=pos).collect();
            parse_line(line.trim(), &mut self.latest);
        }
        self.latest
    }
}
/// `5` -> `COM5`; anything else is used as given.
pub fn normalize_port(input: &str) -> String {
    let input = input.trim();
    if !input.is_empty() && input.chars().all(|c| c.is_ascii_digit()) {
        format!("COM{input}")
    } else if input.to_ascii_uppercase().starts_with("COM") {
        input.to_ascii_uppercase()
    } else {
        input.to_owned()
    }
}
/// Applies one status line. Returns false when nothing could be parsed.
pub fn parse_line(line: &str, reading: &mut AmbientReading) -> bool {
    if line.is_empty() {
        return false;
    }
    if !line.contains("TEMP:") {
        return match line.parse::<f64>() {
            Ok(temp) => {
                reading.temp = Some(temp);
                true
            }
            Err(_) => false,
        };
    }
    let mut parsed = *reading;
    for part in line.split(',').map(str::trim) {
        let (slot, value) = if let Some(v) = part.strip_prefix("TEMP:") {
            (&mut parsed.temp, v)
        } else if let Some(v) = part.strip_prefix("HOLD:") {
            (&mut parsed.hold, v)
        } else if let Some(v) = part.strip_prefix("PWM:") {
            (&mut parsed.pwm, v)
        } else {
            continue;
        };
        match value.trim().parse::<f64>() {
            Ok(v) => *slot = Some(v),
            Err(_) => return false,
        }
    }
    *reading = parsed;
    true
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn parses_full_status_line() {
        let mut reading = AmbientReading::default();
        assert!(parse_line("TEMP:25.30,HOLD:53.60,PWM:255", &mut reading));
        assert_eq!(
            reading,
            AmbientReading {
                temp: Some(25.3),
                hold: Some(53.6),
                pwm: Some(255.0)
            }
        );
    }
    #[test]
    fn bare_number_updates_temperature_only() {
        let mut reading = AmbientReading {
            hold: Some(40.0),
            ..AmbientReading::default()
        };
        assert!(parse_line("24.75", &mut reading));
        assert_eq!(reading.temp, Some(24.75));
        assert_eq!(reading.hold, Some(40.0));
    }
    #[test]
    fn malformed_line_keeps_last_good_values() {
        let mut reading = AmbientReading::default();
        parse_line("TEMP:25.00,HOLD:30.00,PWM:10", &mut reading);
        let before = reading;
        assert!(!parse_line("TEMP:oops,HOLD:31.00", &mut reading));
        assert!(!parse_line("booting...", &mut reading));
        assert_eq!(reading, before);
    }
    #[test]
    fn port_names() {
        assert_eq!(normalize_port("5"), "COM5");
        assert_eq!(normalize_port(" com7 "), "COM7");
        assert_eq!(normalize_port("/dev/ttyACM0"), "/dev/ttyACM0");
    }
}
