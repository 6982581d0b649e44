use btcm7_core::Btcm7Error;
use futures::stream::{self, StreamExt};

/// Run `tasks` with at most `limit` in flight, under an optional deadline.
///
/// Results keep the order of `tasks`. On expiry the whole batch is abandoned
/// and `RequestTimeout(capability)` is returned.
pub async fn join_with_deadline<I, F, T>(
    tasks: I,
    limit: usize,
    deadline: Option<std::time::Duration>,
    capability: &str,
) -> Result<Vec<T>, Btcm7Error>
where
    I: IntoIterator<Item = F>,
    F: std::future::Future<Output = T>,
{
    let all = stream::iter(tasks).buffered(limit.max(1)).collect::<Vec<T>>();
    crate::core::with_request_deadline(deadline, capability, all).await
}

/// Collapse per-ticker failures of one refresh into a single error.
///
/// Rules:
/// - A single failure is returned as-is.
/// - Several failures become `RefreshFailed`, flattened and in input order.
/// - No failures at all becomes `RefreshFailed(vec![])`; callers only collapse
///   non-empty lists.
#[must_use]
pub fn collapse_errors(errors: Vec<Btcm7Error>) -> Btcm7Error {
    let mut flat: Vec<Btcm7Error> = errors.into_iter().flat_map(Btcm7Error::flatten).collect();
    if flat.len() == 1
        && let Some(only) = flat.pop()
    {
        return only;
    }
    Btcm7Error::RefreshFailed(flat)
}
