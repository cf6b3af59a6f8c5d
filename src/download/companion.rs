//! Discovery of companion hash files.
//!
//! Maven repositories and many mod hosts publish `<artifact>.sha1`,
//! `<artifact>.md5`, ... next to each artifact. When a task has no digest of
//! its own, one of those files can stand in for it.

use super::hash::{Digest, HashAlgorithm};
use crate::http::{FetchRequest, Transport};

use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Extract the digest from the body of a companion file.
///
/// Accepts a bare digest as well as the `sha1sum` style `<digest>  <file>`.
pub fn parse_companion(algorithm: HashAlgorithm, body: &str) -> Option<Digest> {
    let token = body.split_whitespace().next()?;
    Digest::for_algorithm(algorithm, token).ok()
}

enum Lookup {
    Found(HashAlgorithm, Digest),
    Missing,
    Unreachable,
    Cancelled,
}

/// Look for companion files next to the first reachable location, strongest
/// algorithm first, and return the first digest found.
///
/// A location that cannot be connected to at all is skipped. Once a location
/// answers, its companions decide the result and later locations are not
/// asked. Failures are not errors: a missing or malformed companion just
/// leaves the download unverified by that algorithm.
pub async fn discover(
    transport: &dyn Transport,
    locations: &[String],
    cancel: &CancellationToken,
) -> Option<(HashAlgorithm, Digest)> {
    for location in locations {
        match lookup(transport, location, cancel).await {
            Lookup::Found(algorithm, digest) => return Some((algorithm, digest)),
            Lookup::Missing | Lookup::Cancelled => return None,
            Lookup::Unreachable => {
                debug!("{} is unreachable, looking for companions elsewhere", location)
            }
        }
    }
    None
}

async fn lookup(transport: &dyn Transport, url: &str, cancel: &CancellationToken) -> Lookup {
    let mut reachable = false;
    for algorithm in HashAlgorithm::ALL {
        if cancel.is_cancelled() {
            return Lookup::Cancelled;
        }
        let companion_url = format!("{}.{}", url, algorithm.extension());
        let response = match transport.fetch(&FetchRequest::new(companion_url.as_str())).await {
            Ok(response) => response,
            Err(e) if !reachable => {
                debug!("No connection for companion {}: {}", companion_url, e);
                return Lookup::Unreachable;
            }
            Err(e) => {
                debug!("No companion at {}: {}", companion_url, e);
                continue;
            }
        };
        reachable = true;
        if !response.status.is_success() {
            debug!("No companion at {}: HTTP {}", companion_url, response.status);
            continue;
        }
        match response.text(&companion_url).await {
            Ok(body) => match parse_companion(algorithm, &body) {
                Some(digest) => {
                    debug!("Found {} companion for {}: {}", algorithm, url, digest);
                    return Lookup::Found(algorithm, digest);
                }
                None => debug!("Ignoring malformed companion {}", companion_url),
            },
            Err(e) => debug!("Could not read companion {}: {}", companion_url, e),
        }
    }
    Lookup::Missing
}
