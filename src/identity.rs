use chrono::Utc;
use rand::Rng;
use std::net::IpAddr;
use std::time::Duration;
use tracing::debug;

/// Sentinel used when the infrastructure metadata endpoint is unreachable or
/// returns nothing useful.
const INSTANCE_ID_FALLBACK: &str = "instance-id-not-found";

/// Default instance-metadata endpoint probed for an infrastructure-assigned
/// instance id.
pub const DEFAULT_METADATA_URL: &str = "http://169.254.169.254/latest/meta-data/instance-id";

const METADATA_TIMEOUT: Duration = Duration::from_secs(1);

/// Stable identity of this running process, baked into stream names.
#[derive(Debug, Clone)]
pub struct ProcessIdentity {
    /// Infrastructure instance id (or sentinel) joined with a per-process
    /// random tag. Distinguishes two processes on the same host.
    pub instance_id: String,
    /// First non-loopback IPv4 address of the host, or a timestamped
    /// fallback when none is available.
    pub host_address: String,
}

/// Resolve the process identity. Best-effort: every failure path degrades to
/// a sentinel value, this never returns an error.
pub async fn resolve(metadata_url: Option<&str>) -> ProcessIdentity {
    let url = metadata_url.unwrap_or(DEFAULT_METADATA_URL);
    let instance_id = fetch_instance_id(url)
        .await
        .unwrap_or_else(|| INSTANCE_ID_FALLBACK.to_string());

    ProcessIdentity {
        instance_id: format!("{}_{}", instance_id, random_tag()),
        host_address: host_address(),
    }
}

async fn fetch_instance_id(url: &str) -> Option<String> {
    let client = reqwest::Client::builder()
        .timeout(METADATA_TIMEOUT)
        .build()
        .ok()?;

    let response = client.get(url).send().await.ok()?;
    if !response.status().is_success() {
        debug!(status = %response.status(), "metadata endpoint refused instance-id lookup");
        return None;
    }

    let id = response.text().await.ok()?;
    let id = id.trim();
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

/// Random per-process tag: start time plus a random integer. Two processes
/// started on the same host still get distinct stream names unless they race
/// to the same millisecond and the same draw.
fn random_tag() -> String {
    format!(
        "{}-random{}",
        Utc::now().timestamp_millis(),
        rand::thread_rng().gen_range(0..100_000)
    )
}

/// First non-loopback IPv4 address found among the host's interfaces.
///
/// Enumeration failure or an all-loopback host yields a timestamped fallback
/// string so the stream name stays unique-ish.
pub fn host_address() -> String {
    match local_ip_address::list_afinet_netifas() {
        Ok(interfaces) => {
            for (_name, address) in interfaces {
                if let IpAddr::V4(v4) = address {
                    if !v4.is_loopback() {
                        return v4.to_string();
                    }
                }
            }
            no_addr_fallback()
        }
        Err(err) => {
            debug!(error = %err, "interface enumeration failed");
            no_addr_fallback()
        }
    }
}

fn no_addr_fallback() -> String {
    format!("no_addr_{}", Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_tag_shape() {
        let tag = random_tag();
        let (millis, rest) = tag.split_once("-random").expect("separator present");
        assert!(millis.parse::<i64>().is_ok());
        let draw: u32 = rest.parse().expect("numeric draw");
        assert!(draw < 100_000);
    }

    #[test]
    fn test_random_tags_differ() {
        // Same millisecond is likely here; the random draw must still keep
        // collisions rare. 20 draws colliding would mean a broken RNG.
        let tags: std::collections::HashSet<String> = (0..20).map(|_| random_tag()).collect();
        assert!(tags.len() > 1);
    }

    #[test]
    fn test_host_address_never_loopback() {
        let address = host_address();
        assert_ne!(address, "127.0.0.1");
        assert!(!address.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_with_unreachable_metadata_uses_sentinel() {
        // Nothing listens on this port; resolution must degrade, not fail.
        let identity = resolve(Some("http://127.0.0.1:1/latest/meta-data/instance-id")).await;
        assert!(identity.instance_id.starts_with(INSTANCE_ID_FALLBACK));
        assert!(identity.instance_id.contains("-random"));
    }

    #[tokio::test]
    async fn test_resolve_uses_metadata_instance_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/latest/meta-data/instance-id")
            .with_status(200)
            .with_body("i-0abc123")
            .create_async()
            .await;

        let url = format!("{}/latest/meta-data/instance-id", server.url());
        let identity = resolve(Some(&url)).await;

        mock.assert_async().await;
        assert!(identity.instance_id.starts_with("i-0abc123_"));
    }
}
