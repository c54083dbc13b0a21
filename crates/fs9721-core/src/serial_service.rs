use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, info, warn};
use serialport::SerialPortInfo;
use std::collections::VecDeque;
use std::io::{self, Read};
use std::fmt;
use std::time::Duration;

/// Line settings of the FS9721_LP3 serial output.
pub const BAUD_RATE: u32 = 2400;

/// Backoff when the port reports no data without blocking.
const IDLE_PAUSE: Duration = Duration::from_millis(5);

#[derive(Debug, thiserror::Error)]
pub enum SerialError {
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A port the meter's adapter cable might be attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    pub kind: &'static str,
    /// USB vendor and product id of the adapter.
    pub usb_id: Option<(u16, u16)>,
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let (kind, usb_id) = match &info.port_type {
            serialport::SerialPortType::UsbPort(usb) => ("USB", Some((usb.vid, usb.pid))),
            serialport::SerialPortType::PciPort => ("PCI", None),
            serialport::SerialPortType::BluetoothPort => ("Bluetooth", None),
            serialport::SerialPortType::Unknown => ("Unknown", None),
        };
        Self { name: info.port_name, kind, usb_id }
    }
}

impl fmt::Display for PortInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.name, self.kind)?;
        if let Some((vid, pid)) = self.usb_id {
            write!(f, " {vid:04X}:{pid:04X}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SerialConfig {
    pub port_name: String,
    pub baud_rate: u32,
    pub data_bits: serialport::DataBits,
    pub parity: serialport::Parity,
    pub stop_bits: serialport::StopBits,
    pub flow_control: serialport::FlowControl,
    /// How long one `read` waits for data before reporting `TimedOut`.
    pub read_timeout: Duration,
    /// Opto-isolated adapter cables are powered from DTR/RTS.
    pub dtr: Option<bool>,
    pub rts: Option<bool>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port_name: "/dev/ttyUSB0".to_string(),
            baud_rate: BAUD_RATE,
            data_bits: serialport::DataBits::Eight,
            parity: serialport::Parity::None,
            stop_bits: serialport::StopBits::One,
            flow_control: serialport::FlowControl::None,
            read_timeout: Duration::from_millis(100),
            dtr: Some(true),
            rts: Some(false),
        }
    }
}

impl SerialConfig {
    pub fn for_port(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug)]
pub enum SerialEvent {
    Rx(Vec<u8>),
    Error(io::Error),
    Closed,
}

enum Command {
    Close,
}

/// Owns the port on a reader thread and exposes received bytes through [`Read`].
pub struct SerialService {
    cfg: SerialConfig,
    tx_cmd: Sender<Command>,
    rx_evt: Receiver<SerialEvent>,
    pending: VecDeque<u8>,
    closed: bool,
}

impl SerialService {
    pub fn list_ports() -> Vec<PortInfo> {
        serialport::available_ports()
            .unwrap_or_default()
            .into_iter()
            .map(PortInfo::from)
            .collect()
    }

    pub fn open(cfg: SerialConfig) -> Result<Self, SerialError> {
        let mut port = serialport::new(&cfg.port_name, cfg.baud_rate)
            .data_bits(cfg.data_bits)
            .parity(cfg.parity)
            .stop_bits(cfg.stop_bits)
            .flow_control(cfg.flow_control)
            .timeout(Duration::from_millis(50))
            .open()?;
        if let Some(state) = cfg.dtr {
            port.write_data_terminal_ready(state)?;
        }
        if let Some(state) = cfg.rts {
            port.write_request_to_send(state)?;
        }
        info!("opened {} at {} baud", cfg.port_name, cfg.baud_rate);

        let (tx_cmd, rx_cmd) = unbounded::<Command>();
        let (tx_evt, rx_evt) = unbounded::<SerialEvent>();
        let port_name = cfg.port_name.clone();

        std::thread::spawn(move || pump(port, &port_name, &tx_evt, &rx_cmd));

        Ok(Self::from_channels(cfg, tx_cmd, rx_evt))
    }

    fn from_channels(cfg: SerialConfig, tx_cmd: Sender<Command>, rx_evt: Receiver<SerialEvent>) -> Self {
        Self {
            cfg,
            tx_cmd,
            rx_evt,
            pending: VecDeque::new(),
            closed: false,
        }
    }

    pub fn close(&self) {
        let _ = self.tx_cmd.send(Command::Close);
    }

    pub fn config(&self) -> &SerialConfig {
        &self.cfg
    }
}

/// Reader thread body: forwards received chunks until closed or the port fails.
fn pump<P: Read>(mut port: P, port_name: &str, tx_evt: &Sender<SerialEvent>, rx_cmd: &Receiver<Command>) {
    let mut buf = [0u8; 256];
    loop {
        match port.read(&mut buf) {
            Ok(n) if n > 0 => {
                if tx_evt.send(SerialEvent::Rx(buf[..n].to_vec())).is_err() {
                    return;
                }
            }
            Ok(_) => std::thread::sleep(IDLE_PAUSE),
            Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::Interrupted) => {}
            Err(e) => {
                warn!("read from {port_name} failed: {e}");
                let _ = tx_evt.send(SerialEvent::Error(e));
                let _ = tx_evt.send(SerialEvent::Closed);
                return;
            }
        }
        while let Ok(cmd) = rx_cmd.try_recv() {
            match cmd {
                Command::Close => {
                    debug!("closing {port_name}");
                    let _ = tx_evt.send(SerialEvent::Closed);
                    return;
                }
            }
        }
    }
}

impl Read for SerialService {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.pending.is_empty() {
            if self.closed {
                return Ok(0);
            }
            match self.rx_evt.recv_timeout(self.cfg.read_timeout) {
                Ok(SerialEvent::Rx(data)) => self.pending.extend(data),
                Ok(SerialEvent::Error(e)) => return Err(e),
                Ok(SerialEvent::Closed) | Err(RecvTimeoutError::Disconnected) => self.closed = true,
                Err(RecvTimeoutError::Timeout) => return Err(io::ErrorKind::TimedOut.into()),
            }
        }
        let n = buf.len().min(self.pending.len());
        for (dst, src) in buf.iter_mut().zip(self.pending.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }
}

impl Drop for SerialService {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> (SerialService, Sender<SerialEvent>, Receiver<Command>) {
        let (tx_cmd, rx_cmd) = unbounded();
        let (tx_evt, rx_evt) = unbounded();
        let cfg = SerialConfig {
            read_timeout: Duration::from_millis(20),
            ..SerialConfig::for_port("/dev/null")
        };
        (SerialService::from_channels(cfg, tx_cmd, rx_evt), tx_evt, rx_cmd)
    }

    #[test]
    fn defaults_match_meter_line_settings() {
        let cfg = SerialConfig::default();
        assert_eq!(cfg.baud_rate, 2400);
        assert_eq!(cfg.data_bits, serialport::DataBits::Eight);
        assert_eq!(cfg.parity, serialport::Parity::None);
        assert_eq!(cfg.stop_bits, serialport::StopBits::One);
        assert_eq!(cfg.flow_control, serialport::FlowControl::None);
        assert_eq!(cfg.dtr, Some(true));
        assert_eq!(cfg.rts, Some(false));
    }

    #[test]
    fn read_drains_chunks_in_order() {
        let (mut svc, tx, _rx) = service();
        tx.send(SerialEvent::Rx(vec![0x11, 0x22, 0x33])).unwrap();
        tx.send(SerialEvent::Rx(vec![0x44])).unwrap();

        let mut buf = [0u8; 2];
        assert_eq!(svc.read(&mut buf).unwrap(), 2);
        assert_eq!(buf, [0x11, 0x22]);
        assert_eq!(svc.read(&mut buf).unwrap(), 1);
        assert_eq!(buf[0], 0x33);
        assert_eq!(svc.read(&mut buf).unwrap(), 1);
        assert_eq!(buf[0], 0x44);
    }

    #[test]
    fn idle_line_times_out() {
        let (mut svc, _tx, _rx) = service();
        let err = svc.read(&mut [0u8; 1]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[test]
    fn reader_failure_is_forwarded_then_eof() {
        let (mut svc, tx, _rx) = service();
        tx.send(SerialEvent::Error(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"))).unwrap();
        tx.send(SerialEvent::Closed).unwrap();

        let err = svc.read(&mut [0u8; 1]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(svc.read(&mut [0u8; 1]).unwrap(), 0);
        assert_eq!(svc.read(&mut [0u8; 1]).unwrap(), 0);
    }

    #[test]
    fn dropped_reader_thread_reads_as_eof() {
        let (mut svc, tx, _rx) = service();
        tx.send(SerialEvent::Rx(vec![0x1A])).unwrap();
        drop(tx);
        let mut buf = [0u8; 4];
        assert_eq!(svc.read(&mut buf).unwrap(), 1);
        assert_eq!(svc.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn close_signals_reader_thread() {
        let (svc, _tx, rx) = service();
        svc.close();
        assert!(matches!(rx.try_recv(), Ok(Command::Close)));
        drop(svc);
        assert!(matches!(rx.try_recv(), Ok(Command::Close)));
    }

    /// Replays scripted results, then reports an unplugged adapter.
    struct Scripted(VecDeque<io::Result<Vec<u8>>>);

    impl Read for Scripted {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.pop_front() {
                Some(Ok(data)) => {
                    buf[..data.len()].copy_from_slice(&data);
                    Ok(data.len())
                }
                Some(Err(e)) => Err(e),
                None => Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged")),
            }
        }
    }

    #[test]
    fn reader_survives_interrupts_and_idle_reads() {
        let port = Scripted(VecDeque::from(vec![
            Err(io::ErrorKind::Interrupted.into()),
            Ok(vec![0x11]),
            Ok(vec![]),
            Err(io::ErrorKind::TimedOut.into()),
            Ok(vec![0x22, 0x33]),
        ]));
        let (tx_evt, rx_evt) = unbounded();
        let (_tx_cmd, rx_cmd) = unbounded();

        pump(port, "test", &tx_evt, &rx_cmd);

        let events: Vec<SerialEvent> = rx_evt.try_iter().collect();
        assert!(matches!(&events[0], SerialEvent::Rx(d) if d == &[0x11]));
        assert!(matches!(&events[1], SerialEvent::Rx(d) if d == &[0x22, 0x33]));
        assert!(matches!(&events[2], SerialEvent::Error(e) if e.kind() == io::ErrorKind::BrokenPipe));
        assert!(matches!(events[3], SerialEvent::Closed));
        assert_eq!(events.len(), 4);
    }

    #[test]
    fn reader_stops_on_close_command() {
        let port = Scripted(VecDeque::from(vec![Ok(vec![0x11])]));
        let (tx_evt, rx_evt) = unbounded();
        let (tx_cmd, rx_cmd) = unbounded();
        tx_cmd.send(Command::Close).unwrap();

        pump(port, "test", &tx_evt, &rx_cmd);

        let events: Vec<SerialEvent> = rx_evt.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], SerialEvent::Closed));
    }

    #[test]
    fn usb_ports_show_vendor_and_product() {
        let usb = PortInfo { name: "/dev/ttyUSB0".into(), kind: "USB", usb_id: Some((0x067B, 0x2303)) };
        assert_eq!(usb.to_string(), "/dev/ttyUSB0\tUSB 067B:2303");

        let pci = PortInfo { name: "/dev/ttyS0".into(), kind: "PCI", usb_id: None };
        assert_eq!(pci.to_string(), "/dev/ttyS0\tPCI");
    }
}
