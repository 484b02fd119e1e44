//! 工具函数模块

use crate::error::{EntrypointError, Result};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tracing::debug;

/// 获取本机主机名
pub fn local_hostname() -> Result<String> {
    let name = hostname::get().map_err(|e| EntrypointError::address_resolution("<local>", e))?;
    let name = name.to_string_lossy().trim().to_string();
    if name.is_empty() {
        return Err(EntrypointError::address_resolution(
            "<local>",
            "hostname is empty",
        ));
    }
    Ok(name)
}

/// 解析主机名对应的网络地址
///
/// 优先返回 IPv4 地址，没有时返回第一个解析结果。
pub async fn resolve_host_address(host: &str) -> Result<IpAddr> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(ip);
    }

    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, 0))
        .await
        .map_err(|e| EntrypointError::address_resolution(host, e))?
        .collect();

    addrs
        .iter()
        .find(|a| a.is_ipv4())
        .or_else(|| addrs.first())
        .map(|a| a.ip())
        .ok_or_else(|| EntrypointError::address_resolution(host, "no addresses returned"))
}

/// 按 Go `time.Duration` 的格式输出（Consul 解析的格式）
///
/// 不足一秒或带毫秒的时长输出为毫秒，例如 `500ms`、`1500ms`。
pub fn format_go_duration(d: Duration) -> String {
    if d.subsec_nanos() != 0 {
        return format!("{}ms", d.as_millis());
    }

    let total = d.as_secs();
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{}h{}m{}s", h, m, s)
    } else if m > 0 {
        format!("{}m{}s", m, s)
    } else {
        format!("{}s", s)
    }
}

/// 等待服务启动就绪（通过 TCP 连接重试）
///
/// 使用指数退避重试连接，直到端口可以接受连接或超过 `total_timeout`。
pub async fn wait_for_server_ready(address: SocketAddr, total_timeout: Duration) -> Result<()> {
    const INITIAL_DELAY_MS: u64 = 50;
    const MAX_DELAY_MS: u64 = 500;

    let start = std::time::Instant::now();
    let mut delay_ms = INITIAL_DELAY_MS;
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;

        match timeout(Duration::from_millis(100), TcpStream::connect(address)).await {
            Ok(Ok(_)) => {
                debug!(
                    address = %address,
                    attempts = attempt,
                    elapsed_ms = start.elapsed().as_millis(),
                    "Server is ready"
                );
                return Ok(());
            }
            Ok(Err(e)) => {
                debug!(
                    address = %address,
                    attempt = attempt,
                    error = %e,
                    "Connection attempt failed, retrying..."
                );
            }
            Err(_) => {
                debug!(
                    address = %address,
                    attempt = attempt,
                    "Connection attempt timed out, retrying..."
                );
            }
        }

        if start.elapsed() >= total_timeout {
            return Err(EntrypointError::server(format!(
                "Server readiness check timeout after {:?} ({} attempts)",
                total_timeout, attempt
            )));
        }

        sleep(Duration::from_millis(delay_ms)).await;
        delay_ms = (delay_ms * 2).min(MAX_DELAY_MS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn go_duration_format() {
        assert_eq!(format_go_duration(Duration::from_secs(10)), "10s");
        assert_eq!(format_go_duration(Duration::from_secs(0)), "0s");
        assert_eq!(format_go_duration(Duration::from_secs(90)), "1m30s");
        assert_eq!(format_go_duration(Duration::from_secs(3600)), "1h0m0s");
        assert_eq!(format_go_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(format_go_duration(Duration::from_millis(1500)), "1500ms");
    }

    #[tokio::test]
    async fn literal_ip_needs_no_lookup() {
        let ip = resolve_host_address("10.1.2.3").await.unwrap();
        assert_eq!(ip.to_string(), "10.1.2.3");
    }

    #[tokio::test]
    async fn localhost_resolves() {
        let ip = resolve_host_address("localhost").await.unwrap();
        assert!(ip.is_loopback());
    }

    #[tokio::test]
    async fn unresolvable_host_is_address_error() {
        let err = resolve_host_address("no-such-host.invalid").await.unwrap_err();
        assert!(matches!(err, EntrypointError::AddressResolution { .. }));
    }

    #[tokio::test]
    async fn ready_once_listener_bound() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        wait_for_server_ready(addr, Duration::from_secs(2)).await.unwrap();
    }

    #[tokio::test]
    async fn ready_check_times_out_on_closed_port() {
        let addr = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let err = wait_for_server_ready(addr, Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(matches!(err, EntrypointError::Server(_)));
    }
}
