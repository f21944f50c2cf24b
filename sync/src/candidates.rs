//! The candidate list as a lazy stream of contract reads.

use ballot_gateway::{ContractGateway, GatewayError};
use ballot_types::Candidate;
use futures_util::stream::{self, Stream, StreamExt, TryStreamExt};
use std::sync::Arc;

/// Stream the candidate list: `candidatesCount()`, then `candidates(i)` for
/// `i` in `1..=count`, one read at a time.
///
/// Nothing is read until the stream is polled, and each call starts over, so
/// a failed read is retried by calling again.
pub fn candidate_stream(
    gateway: Arc<dyn ContractGateway>,
) -> impl Stream<Item = Result<Candidate, GatewayError>> + Send {
    stream::once(async move {
        let count = gateway.candidates_count().await?;
        Ok::<_, GatewayError>((gateway, count))
    })
    .map_ok(|(gateway, count)| {
        stream::iter(1..=count).then(move |id| {
            let gateway = Arc::clone(&gateway);
            async move { gateway.candidate(id).await }
        })
    })
    .try_flatten()
}

/// Collect [`candidate_stream`]; fails on the first failed read.
pub async fn read_candidates(gateway: Arc<dyn ContractGateway>) -> Result<Vec<Candidate>, GatewayError> {
    candidate_stream(gateway).try_collect().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballot_gateway::ContractMethod;
    use ballot_nullables::NullGateway;
    use ballot_types::Address;

    fn gateway() -> Arc<NullGateway> {
        Arc::new(NullGateway::new(Address::parse("0xA").unwrap()))
    }

    #[tokio::test]
    async fn empty_contract_reads_only_the_count() {
        let gw = gateway();
        let list = read_candidates(gw.clone()).await.unwrap();
        assert!(list.is_empty());
        assert_eq!(gw.read_count(ContractMethod::CandidatesCount), 1);
        assert_eq!(gw.read_count(ContractMethod::Candidates), 0);
    }

    #[tokio::test]
    async fn candidates_arrive_in_id_order() {
        let gw = gateway();
        gw.seed_candidate("Alice", 1);
        gw.seed_candidate("Bob", 0);
        let list = read_candidates(gw.clone()).await.unwrap();
        assert_eq!(
            list,
            vec![Candidate::new(1, "Alice", 1), Candidate::new(2, "Bob", 0)]
        );
    }

    #[tokio::test]
    async fn stream_is_lazy() {
        let gw = gateway();
        let stream = candidate_stream(gw.clone());
        assert_eq!(gw.read_count(ContractMethod::CandidatesCount), 0);
        drop(stream);
    }

    #[tokio::test]
    async fn failed_entry_read_fails_the_list() {
        let gw = gateway();
        gw.seed_candidate("Alice", 0);
        gw.fail_reads(ContractMethod::Candidates, "missing trie node");
        let err = read_candidates(gw.clone()).await.unwrap_err();
        assert_eq!(err.message(), "missing trie node");
    }
}
