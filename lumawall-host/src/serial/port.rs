//! Serial port configuration and connection management

use std::io::{Read, Write};
use std::time::Duration;

use log::debug;
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};

use lumawall_protocol::LinkWriter;

use super::{ByteLink, SerialError};

/// Configuration for the co-processor link
#[derive(Debug, Clone)]
pub struct PortConfig {
    /// Serial port path (e.g., /dev/ttyUSB0)
    pub port_path: String,
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
    /// Blocking I/O timeout; the runtime only reads what is already buffered
    pub timeout: Duration,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            port_path: crate::config::DEFAULT_PORT.to_string(),
            baud_rate: crate::config::DEFAULT_BAUDRATE,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
            timeout: Duration::from_millis(10),
        }
    }
}

impl PortConfig {
    /// 8N1 without flow control on `port_path`
    pub fn new(port_path: &str) -> Self {
        Self {
            port_path: port_path.to_string(),
            ..Default::default()
        }
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Open serial connection to the co-processor
pub struct SerialLink {
    port: Box<dyn SerialPort>,
    config: PortConfig,
}

impl SerialLink {
    pub fn open(config: PortConfig) -> Result<Self, SerialError> {
        let port = serialport::new(&config.port_path, config.baud_rate)
            .data_bits(config.data_bits)
            .parity(config.parity)
            .stop_bits(config.stop_bits)
            .flow_control(config.flow_control)
            .timeout(config.timeout)
            .open()
            .map_err(|source| SerialError::Open {
                path: config.port_path.clone(),
                source,
            })?;

        debug!("Opened {} at {} baud", config.port_path, config.baud_rate);
        Ok(Self { port, config })
    }

    pub fn config(&self) -> &PortConfig {
        &self.config
    }
}

impl LinkWriter for SerialLink {
    type Error = SerialError;

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), SerialError> {
        Write::write_all(&mut self.port, bytes)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SerialError> {
        Write::flush(&mut self.port)?;
        Ok(())
    }
}

impl ByteLink for SerialLink {
    fn read_available(&mut self, buffer: &mut [u8]) -> Result<usize, SerialError> {
        let pending = self.port.bytes_to_read()? as usize;
        if pending == 0 {
            return Ok(0);
        }
        let len = pending.min(buffer.len());
        match self.port.read(&mut buffer[..len]) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn discard_input(&mut self) -> Result<(), SerialError> {
        self.port.clear(ClearBuffer::All)?;
        Ok(())
    }
}

/// A serial port found on the system
#[derive(Debug, Clone)]
pub struct PortInfo {
    pub path: String,
    /// Short description (USB product or port type)
    pub description: String,
    pub vid_pid: Option<(u16, u16)>,
}

/// List available serial ports
pub fn list_ports() -> Result<Vec<PortInfo>, SerialError> {
    let ports = serialport::available_ports()?;

    Ok(ports
        .into_iter()
        .map(|p| {
            let (description, vid_pid) = match p.port_type {
                serialport::SerialPortType::UsbPort(info) => (
                    info.product.unwrap_or_else(|| "USB Serial".to_string()),
                    Some((info.vid, info.pid)),
                ),
                serialport::SerialPortType::PciPort => ("PCI Serial".to_string(), None),
                serialport::SerialPortType::BluetoothPort => ("Bluetooth".to_string(), None),
                serialport::SerialPortType::Unknown => ("Unknown".to_string(), None),
            };
            PortInfo {
                path: p.port_name,
                description,
                vid_pid,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PortConfig::default();
        assert_eq!(config.port_path, "/dev/ttyUSB0");
        assert_eq!(config.baud_rate, 1_000_000);
        assert_eq!(config.data_bits, DataBits::Eight);
        assert_eq!(config.parity, Parity::None);
        assert_eq!(config.flow_control, FlowControl::None);
    }

    #[test]
    fn test_config_builder() {
        let config = PortConfig::new("/dev/ttyACM0")
            .with_baud_rate(115200)
            .with_timeout(Duration::from_secs(1));

        assert_eq!(config.port_path, "/dev/ttyACM0");
        assert_eq!(config.baud_rate, 115200);
        assert_eq!(config.timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_open_missing_port() {
        let result = SerialLink::open(PortConfig::new("/dev/lumawall-does-not-exist"));
        assert!(matches!(result, Err(SerialError::Open { .. })));
    }
}
