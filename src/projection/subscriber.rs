//! Consumption loop over the block stream. The transport that produces the
//! stream is an external collaborator; anything that yields newline-delimited
//! JSON notifications (a pipe from the chain nats relay, stdin in local runs)
//! plugs in here.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use super::chain::StreamMessage;
use super::store::{CheckpointPatch, ProjectedStore};
use super::Projector;
use crate::errors;

/// Drives the projector until the stream ends. One message is fully applied
/// and checkpointed before the next is read; that sequencing is what keeps
/// the curve and balance accumulators correct, so there is deliberately no
/// concurrency here.
///
/// Malformed lines are logged and skipped. Dispersal and rollback errors are
/// returned to the caller, which must treat them as fatal.
pub async fn run<S, R>(projector: &mut Projector<S>, reader: R) -> crate::Result<()>
where
    S: ProjectedStore,
    R: AsyncBufRead + Unpin,
{
    let mut last_seen = projector
        .store()
        .load_checkpoint()
        .await?
        .map(|checkpoint| checkpoint.block_num)
        .unwrap_or(0);
    if last_seen > 0 {
        tracing::info!(
            target: crate::LOGGER_MSG,
            "Resuming from checkpoint block {}",
            last_seen
        );
    }

    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await.map_err(errors::ErrorKind::from)? {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let message: StreamMessage = match serde_json::from_str(trimmed) {
            Ok(message) => message,
            Err(error) => {
                tracing::warn!(
                    target: crate::LOGGER_MSG,
                    "Skipping malformed stream message: {}",
                    error
                );
                continue;
            }
        };

        match message {
            StreamMessage::Block(block) => {
                if block.block_num <= last_seen {
                    tracing::debug!(
                        target: crate::LOGGER_MSG,
                        "Skipping replayed block {}",
                        block.block_num
                    );
                    continue;
                }

                projector.disperse(&block).await?;
                last_seen = block.block_num;
                projector
                    .store()
                    .save_checkpoint(&CheckpointPatch {
                        block_num: Some(block.block_num),
                        block_id: Some(block.id.clone()),
                        block_time: Some(block.block_time),
                        ..Default::default()
                    })
                    .await?;
            }
            StreamMessage::IrreversibleBlock(irreversible) => {
                projector.register_lib(irreversible.block_num).await;
                projector
                    .store()
                    .save_checkpoint(&CheckpointPatch {
                        last_irreversible: Some(irreversible.block_num),
                        ..Default::default()
                    })
                    .await?;
            }
            StreamMessage::Fork(fork) => {
                tracing::info!(
                    target: crate::LOGGER_MSG,
                    "STARTING FORK ON BLOCK {}",
                    fork.base_block_num
                );
                projector.handle_fork(fork.base_block_num).await?;
                if fork.base_block_num < last_seen {
                    last_seen = fork.base_block_num;
                }
                projector
                    .store()
                    .save_checkpoint(&CheckpointPatch {
                        block_num: Some(fork.base_block_num),
                        last_fork: Some(fork.base_block_num),
                        ..Default::default()
                    })
                    .await?;
            }
        }
    }

    tracing::info!(target: crate::LOGGER_MSG, "Block stream ended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::testing::MemStore;
    use super::*;

    fn block_line(block_num: u64, trx_id: &str) -> String {
        serde_json::json!({
            "type": "BLOCK",
            "data": {
                "blockNum": block_num,
                "id": format!("block-{}", block_num),
                "blockTime": "2019-10-21T12:00:00Z",
                "transactions": [{
                    "id": trx_id,
                    "actions": [{
                        "code": "cyber.token",
                        "receiver": "cyber.token",
                        "action": "transfer",
                        "args": {"from": "alice", "to": "bob", "quantity": "1.000 CMN", "memo": ""},
                        "events": []
                    }]
                }]
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_run_processes_and_checkpoints() {
        let mut projector = Projector::new(MemStore::default());
        let input = format!(
            "{}\n{}\n{}\n",
            block_line(101, "trx1"),
            r#"{"type": "IRREVERSIBLE_BLOCK", "data": {"blockNum": 101}}"#,
            block_line(102, "trx2"),
        );

        run(&mut projector, input.as_bytes()).await.unwrap();

        let state = projector.store().state.lock().unwrap();
        assert_eq!(state.transfers.len(), 2);
        assert!(state.transfers[0].1);
        assert!(!state.transfers[1].1);

        let checkpoint = state.checkpoint.as_ref().unwrap();
        assert_eq!(checkpoint.block_num, 102);
        assert_eq!(checkpoint.last_irreversible, 101);
    }

    #[tokio::test]
    async fn test_run_skips_blocks_at_or_below_checkpoint() {
        let mut projector = Projector::new(MemStore::default());
        projector
            .store()
            .save_checkpoint(&CheckpointPatch {
                block_num: Some(101),
                ..Default::default()
            })
            .await
            .unwrap();

        let input = format!("{}\n{}\n", block_line(101, "trx1"), block_line(102, "trx2"));
        run(&mut projector, input.as_bytes()).await.unwrap();

        let state = projector.store().state.lock().unwrap();
        assert_eq!(state.transfers.len(), 1);
        assert_eq!(state.transfers[0].0.block_num, 102);
    }

    #[tokio::test]
    async fn test_run_fork_rewinds_and_accepts_replacements() {
        let mut projector = Projector::new(MemStore::default());
        let input = format!(
            "{}\n{}\n{}\n{}\n",
            block_line(101, "trx1"),
            block_line(102, "trx2"),
            r#"{"type": "FORK", "data": {"baseBlockNum": 101}}"#,
            block_line(102, "trx2b"),
        );

        run(&mut projector, input.as_bytes()).await.unwrap();

        let state = projector.store().state.lock().unwrap();
        assert_eq!(state.transfers.len(), 2);
        assert_eq!(state.transfers[1].0.trx_id, "trx2b");
        assert_eq!(state.checkpoint.as_ref().unwrap().last_fork, 101);
    }

    #[tokio::test]
    async fn test_run_skips_malformed_lines() {
        let mut projector = Projector::new(MemStore::default());
        let input = format!("not json\n{}\n", block_line(101, "trx1"));

        run(&mut projector, input.as_bytes()).await.unwrap();

        let state = projector.store().state.lock().unwrap();
        assert_eq!(state.transfers.len(), 1);
    }
}
