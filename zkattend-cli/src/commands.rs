//! Subcommand handlers
//!
//! Each handler prints one notification line per outcome and returns a
//! [`Status`] for the process exit code.

use std::time::Duration;

use anyhow::{Result, bail};
use tracing::info;
use zkattend_sync::{
    EmployeeStore, IntervalStore, MemoryLedger, Notification, RunReport, SyncError, SyncService,
    download_notification,
};

type Service = SyncService<MemoryLedger>;

/// How a handler finished; maps to the process exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Status {
    Ok,
    /// Device, network or ledger failure
    Failed,
    /// Something the operator has to change before retrying
    UserError,
}

impl Status {
    pub fn of(err: &SyncError) -> Self {
        if err.is_user_error() {
            Status::UserError
        } else {
            Status::Failed
        }
    }

    fn of_download(result: &zkattend_sync::Result<RunReport>) -> Self {
        match result {
            Ok(report) if report.failures.is_empty() => Status::Ok,
            Ok(_) => Status::Failed,
            Err(e) => Status::of(e),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::Failed => 1,
            Status::UserError => 2,
        }
    }
}

fn report<T>(result: zkattend_sync::Result<T>, success: impl FnOnce(T) -> String) -> Status {
    match result {
        Ok(value) => {
            println!("{}", Notification::success(success(value)));
            Status::Ok
        }
        Err(e) => {
            println!("{}", Notification::failure(e.to_string()));
            Status::of(&e)
        }
    }
}

pub async fn test(service: &Service, device: &str) -> Status {
    report(service.test_connection(device).await, |info| {
        format!("{}: {}", device, info)
    })
}

pub async fn set_clock(service: &Service, device: &str) -> Status {
    report(service.set_clock(device).await, |at| {
        format!("{} clock set to {}", device, at)
    })
}

pub async fn clear(service: &Service, device: &str, yes: bool) -> Status {
    if !yes {
        println!(
            "{}",
            Notification::failure(format!(
                "clearing {} deletes its punches for good; run again with --yes",
                device
            ))
        );
        return Status::UserError;
    }
    report(service.clear_device_log(device).await, |dropped| {
        format!(
            "{} attendance log cleared, {} raw-log entries removed",
            device, dropped
        )
    })
}

pub async fn restart(service: &Service, device: &str) -> Status {
    report(service.restart_device(device).await, |()| {
        format!("{} is restarting", device)
    })
}

pub async fn download(service: &Service, device: Option<&str>) -> Status {
    match device {
        Some(device) => {
            let result = service.download(device).await;
            println!("{}", download_notification(device, &result));
            Status::of_download(&result)
        }
        None => download_all(service).await,
    }
}

/// Worst status over all devices
async fn download_all(service: &Service) -> Status {
    let mut status = Status::Ok;
    for (device, result) in service.download_all().await {
        println!("{}", download_notification(&device, &result));
        status = status.max(Status::of_download(&result));
    }
    status
}

pub async fn schedule(service: &Service) -> Result<Status> {
    let secs = service.config().schedule.interval_secs;
    if service.config().devices.is_empty() {
        bail!("no devices configured");
    }
    info!("Downloading from {} devices every {}s", service.config().devices.len(), secs);

    let mut ticker = tokio::time::interval(Duration::from_secs(secs));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                download_all(service).await;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping schedule");
                return Ok(Status::Ok);
            }
        }
    }
}

pub async fn intervals(service: &Service, device_user: &str) -> Result<Status> {
    let ledger = service.ledger();
    let Some(employee) = ledger.find_employee(device_user).await? else {
        println!(
            "{}",
            Notification::failure(format!("no employee punches as device user {}", device_user))
        );
        return Ok(Status::UserError);
    };

    println!("{} {} ({})", employee.id, employee.name, device_user);
    for interval in ledger.intervals_for(employee.id).await? {
        match interval.check_out {
            Some(out) => {
                let worked = out - interval.check_in;
                println!(
                    "  {}  ->  {}  ({}h{:02}m)",
                    interval.check_in,
                    out,
                    worked.num_hours(),
                    worked.num_minutes() % 60
                );
            }
            None => println!("  {}  ->  (open)", interval.check_in),
        }
    }
    Ok(Status::Ok)
}
