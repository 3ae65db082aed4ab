//! Print the user directory and punch log of a terminal

use zkattend::Device;

#[tokio::main]
async fn main() -> zkattend::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let ip = std::env::var("DEVICE_IP").unwrap_or_else(|_| "192.168.1.201".to_string());
    let udp = std::env::var("DEVICE_UDP").is_ok();

    let mut device = if udp {
        Device::new_udp(ip, zkattend::DEFAULT_PORT)
    } else {
        Device::new(ip, zkattend::DEFAULT_PORT)
    };
    device.connect().await?;
    println!("Device: {}", device.get_device_info().await?);

    // Keep punches from landing mid-transfer
    device.disable_device().await?;
    let result = async {
        let users = device.get_users().await?;
        for user in &users {
            println!("{}", user);
        }
        for record in device.get_attendance_for(&users).await? {
            println!("{}", record);
        }
        Ok::<_, zkattend::Error>(())
    }
    .await;
    device.enable_device().await?;
    device.disconnect().await?;

    result
}
