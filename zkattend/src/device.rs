//! High-level device interface

use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use chrono::NaiveDateTime;
use tracing::{debug, info, trace, warn};

use zkattend_core::constants::{
    data_types, options, COMMKEY_TICKS, DEFAULT_TIMEOUT, MAX_BUFFER_SIZE,
};
use zkattend_core::{make_commkey, Command, Packet, Session};
use zkattend_transport::{TcpTransport, Transport, UdpTransport};
use zkattend_types::{
    parse_attendance, parse_users, time, AttendanceRecord, Capacity, DeviceInfo, DeviceUser,
};

use crate::error::{Error, Result};

/// ZKTeco attendance terminal
///
/// # Examples
///
/// ```no_run
/// use zkattend::Device;
///
/// #[tokio::main]
/// async fn main() -> zkattend::Result<()> {
///     let mut device = Device::new("192.168.1.201", 4370);
///     device.connect().await?;
///
///     device.disable_device().await?;
///     let punches = device.get_attendance().await?;
///     device.enable_device().await?;
///
///     println!("{} punches on device", punches.len());
///     device.disconnect().await?;
///     Ok(())
/// }
/// ```
pub struct Device {
    transport: Box<dyn Transport>,
    session: Session,
    timeout: Duration,
    password: u32,
}

impl Device {
    /// Create a new device instance (TCP transport)
    pub fn new(ip: impl Into<String>, port: u16) -> Self {
        Self::with_transport(Box::new(TcpTransport::new(ip, port)))
    }

    /// Create a new device instance using UDP transport
    pub fn new_udp(ip: impl Into<String>, port: u16) -> Self {
        Self::with_transport(Box::new(UdpTransport::new(ip, port)))
    }

    /// Create a device over an arbitrary transport
    pub fn with_transport(mut transport: Box<dyn Transport>) -> Self {
        let timeout = Duration::from_secs(DEFAULT_TIMEOUT);
        transport.set_connect_timeout(timeout);
        Self {
            transport,
            session: Session::new(),
            timeout,
            password: 0,
        }
    }

    /// Set connect and per-reply timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.transport.set_connect_timeout(timeout);
        self
    }

    /// Set CommKey password (default: 0)
    pub fn with_password(mut self, password: u32) -> Self {
        self.password = password;
        self
    }

    pub fn remote_addr(&self) -> String {
        self.transport.remote_addr()
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        self.session.is_connected() && self.transport.is_connected()
    }

    /// Connect to device
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Network connection fails or times out
    /// - Device doesn't respond
    /// - Device requires a CommKey and the configured one is wrong
    pub async fn connect(&mut self) -> Result<()> {
        info!("Connecting to {}...", self.transport.remote_addr());

        tokio::time::timeout(self.timeout, self.transport.connect())
            .await
            .map_err(|_| zkattend_transport::Error::ConnectionTimeout)??;

        let response = self.exchange(&Packet::new(Command::Connect, 0, 0)).await?;

        match response.command {
            Command::AckOk => {
                self.session.initialize(response.session_id, false)?;
                info!("Connected (session_id={})", response.session_id);
                Ok(())
            }
            Command::AckUnauth => {
                let session_id = response.session_id;
                let key = make_commkey(self.password, session_id, COMMKEY_TICKS);

                debug!("Device requires CommKey, sending auth (session_id={})", session_id);

                let auth = Packet::with_payload(Command::Auth, session_id, 0, key);
                let reply = self.exchange(&auth).await?;

                match reply.command {
                    Command::AckOk => {
                        self.session.initialize(session_id, true)?;
                        info!("Authenticated (session_id={})", session_id);
                        Ok(())
                    }
                    Command::AckUnauth | Command::AckError => Err(Error::InvalidResponse(
                        "Authentication failed - incorrect CommKey".into(),
                    )),
                    other => Err(Error::InvalidResponse(format!(
                        "Unexpected auth response: {}",
                        other
                    ))),
                }
            }
            other => Err(Error::InvalidResponse(format!(
                "Unexpected connect response: {}",
                other
            ))),
        }
    }

    /// Disconnect from device
    pub async fn disconnect(&mut self) -> Result<()> {
        if !self.transport.is_connected() {
            self.session.close();
            return Ok(());
        }

        info!("Disconnecting from {}...", self.transport.remote_addr());

        if self.session.is_connected() {
            let packet = self.create_packet(Command::Exit, Bytes::new());
            if let Err(e) = self.exchange(&packet).await {
                warn!("Failed to send EXIT command: {}", e);
            }
        }

        self.transport.disconnect().await?;
        self.session.close();

        Ok(())
    }

    /// Firmware, serial number, name, platform and store counts
    pub async fn get_device_info(&mut self) -> Result<DeviceInfo> {
        let version = self.command(Command::GetVersion, Bytes::new()).await?;
        let firmware = String::from_utf8_lossy(&version.payload)
            .trim_end_matches('\0')
            .to_string();

        let serial = self
            .read_option(options::SERIAL_NUMBER)
            .await?
            .unwrap_or_else(|| "UNKNOWN".to_string());

        let mut info = DeviceInfo::new(serial, firmware);
        info.device_name = self.read_option(options::DEVICE_NAME).await?;
        info.platform = self.read_option(options::PLATFORM).await?;
        info.capacity = self.read_capacity().await?;

        debug!("Device info: {}", info);

        Ok(info)
    }

    /// Read user, fingerprint and record counts
    pub async fn read_capacity(&mut self) -> Result<Capacity> {
        let reply = self.command(Command::GetFreeSizes, Bytes::new()).await?;
        Ok(Capacity::parse(&reply.payload)?)
    }

    /// Enable device (normal operation mode)
    pub async fn enable_device(&mut self) -> Result<()> {
        debug!("Enabling device...");
        self.command(Command::EnableDevice, Bytes::new()).await?;
        Ok(())
    }

    /// Disable device (terminal shows "Working..." and takes no punches)
    pub async fn disable_device(&mut self) -> Result<()> {
        debug!("Disabling device...");
        self.command(Command::DisableDevice, Bytes::new()).await?;
        Ok(())
    }

    /// Restart device; the session ends with it
    pub async fn restart(&mut self) -> Result<()> {
        warn!("Restarting device...");

        self.command(Command::Restart, Bytes::new()).await?;
        self.transport.disconnect().await?;
        self.session.close();

        Ok(())
    }

    /// Read the terminal's wall clock
    pub async fn get_time(&mut self) -> Result<NaiveDateTime> {
        let reply = self.command(Command::GetTime, Bytes::new()).await?;
        let raw = reply
            .payload
            .get(..4)
            .ok_or_else(|| Error::InvalidResponse("time reply shorter than 4 bytes".into()))?;
        Ok(time::decode(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))?)
    }

    /// Set the terminal's wall clock
    pub async fn set_time(&mut self, at: NaiveDateTime) -> Result<()> {
        info!("Setting device clock to {}", at);
        let payload = Bytes::copy_from_slice(&time::encode(&at).to_le_bytes());
        self.command(Command::SetTime, payload).await?;
        Ok(())
    }

    /// Read the enrolled-user directory
    pub async fn get_users(&mut self) -> Result<Vec<DeviceUser>> {
        let capacity = self.read_capacity().await?;
        if capacity.users == 0 {
            return Ok(Vec::new());
        }

        let data = self
            .read_with_buffer(Command::UserTempRrq, data_types::FCT_USER, 0)
            .await?;
        let users = parse_users(&data, capacity.users)?;

        debug!("Read {} users", users.len());
        Ok(users)
    }

    /// Read the full attendance log
    pub async fn get_attendance(&mut self) -> Result<Vec<AttendanceRecord>> {
        let users = self.get_users().await?;
        self.get_attendance_for(&users).await
    }

    /// Read the full attendance log, resolving compact records through an
    /// already-fetched user directory
    pub async fn get_attendance_for(
        &mut self,
        users: &[DeviceUser],
    ) -> Result<Vec<AttendanceRecord>> {
        let capacity = self.read_capacity().await?;
        if capacity.records == 0 {
            return Ok(Vec::new());
        }

        let data = self.read_with_buffer(Command::AttLogRrq, 0, 0).await?;
        let records = parse_attendance(&data, capacity.records, users)?;

        debug!("Read {} attendance records", records.len());
        Ok(records)
    }

    /// Delete every punch stored on the terminal
    pub async fn clear_attendance(&mut self) -> Result<()> {
        warn!("Clearing attendance log on {}", self.transport.remote_addr());
        self.command(Command::ClearAttLog, Bytes::new()).await?;
        Ok(())
    }

    // Helper methods

    async fn read_option(&mut self, key: &str) -> Result<Option<String>> {
        let mut payload = BytesMut::with_capacity(key.len() + 1);
        payload.put_slice(key.as_bytes());
        payload.put_u8(0);

        let reply = self.command(Command::OptionsRrq, payload.freeze()).await?;
        Ok(DeviceInfo::option_value(&reply.payload))
    }

    /// Bulk read through the terminal's transfer buffer.
    ///
    /// The terminal either answers with the data inline, or with the total
    /// size, in which case the data is pulled in chunks and the buffer freed.
    async fn read_with_buffer(&mut self, command: Command, fct: u8, ext: u32) -> Result<Bytes> {
        let mut request = BytesMut::with_capacity(11);
        request.put_u8(1);
        request.put_u16_le(command.into());
        request.put_u32_le(u32::from(fct));
        request.put_u32_le(ext);

        let reply = self.command(Command::PrepareBuffer, request.freeze()).await?;

        if reply.command == Command::Data {
            return Ok(reply.payload);
        }

        let size = reply
            .payload
            .get(1..5)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .ok_or_else(|| Error::InvalidResponse("buffer reply carries no size".into()))?;

        debug!("{} buffered: {} bytes", command, size);

        if size > MAX_BUFFER_SIZE {
            return Err(Error::InvalidResponse(format!(
                "buffer of {} bytes exceeds the {} byte limit",
                size, MAX_BUFFER_SIZE
            )));
        }

        let max_chunk = self.transport.max_chunk();
        let mut data = BytesMut::with_capacity(size as usize);
        let mut start = 0u32;
        while start < size {
            let len = max_chunk.min(size - start);
            let chunk = self.read_chunk(start, len).await?;
            data.put_slice(&chunk);
            start += len;
        }

        self.command(Command::FreeData, Bytes::new()).await?;

        Ok(data.freeze())
    }

    async fn read_chunk(&mut self, start: u32, len: u32) -> Result<Bytes> {
        let mut request = BytesMut::with_capacity(8);
        request.put_u32_le(start);
        request.put_u32_le(len);

        let first = self.command(Command::ReadBuffer, request.freeze()).await?;

        match first.command {
            Command::Data => Ok(first.payload),
            Command::PrepareData => {
                let mut data = BytesMut::new();
                loop {
                    let packet = self.receive_packet().await?;
                    match packet.command {
                        Command::Data => data.put_slice(&packet.payload),
                        Command::AckOk => break,
                        other => {
                            return Err(Error::InvalidResponse(format!(
                                "Unexpected packet while streaming chunk: {}",
                                other
                            )));
                        }
                    }
                }
                trace!("Chunk at {}: {} bytes", start, data.len());
                Ok(data.freeze())
            }
            other => Err(Error::InvalidResponse(format!(
                "Unexpected chunk response: {}",
                other
            ))),
        }
    }

    /// Send a request in the current session and return the reply
    async fn command(&mut self, command: Command, payload: Bytes) -> Result<Packet> {
        self.ensure_connected()?;

        let packet = self.create_packet(command, payload);
        let reply = self.exchange(&packet).await?;

        if reply.is_error() || reply.command == Command::AckUnauth {
            return Err(Error::Rejected {
                command,
                reply: reply.command,
            });
        }

        Ok(reply)
    }

    fn ensure_connected(&self) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        Ok(())
    }

    fn create_packet(&self, command: Command, payload: Bytes) -> Packet {
        Packet::with_payload(
            command,
            self.session.session_id(),
            self.session.next_reply_id(),
            payload,
        )
    }

    async fn exchange(&mut self, packet: &Packet) -> Result<Packet> {
        trace!("Sending: {:?}", packet);
        self.transport.send(&packet.encode()).await?;
        self.receive_packet().await
    }

    async fn receive_packet(&mut self) -> Result<Packet> {
        let buf = self.transport.receive(self.timeout).await?;
        let packet = Packet::decode(buf)?;
        trace!("Received: {:?}", packet);
        Ok(packet)
    }
}
