//! 批量分发
//!
//! 将事件id列表按固定大小切片，每片对下游目标发起一次调用。

use std::sync::Arc;

use tracing::{debug, error};
use uuid::Uuid;

use event_scheduler_domain::messaging::InvocationClient;

/// 将有序列表切分为大小不超过 `size` 的片段，保持原顺序
pub fn make_chunks<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    if items.is_empty() {
        return Vec::new();
    }
    items.chunks(size.max(1)).map(|c| c.to_vec()).collect()
}

/// 单次分发的结果统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub chunks: usize,
    pub failed_chunks: usize,
}

/// 批量分发器，Intake与Sweep共用
///
/// 调用失败只记录日志，不重试也不中断后续分片；失败分片中的事件
/// 仍处于NEW状态，会被下一轮扫描重新发现。
pub struct BatchDispatcher {
    invoker: Arc<dyn InvocationClient>,
    target: String,
    chunk_size: usize,
}

impl BatchDispatcher {
    pub fn new(invoker: Arc<dyn InvocationClient>, target: String, chunk_size: usize) -> Self {
        Self {
            invoker,
            target,
            chunk_size,
        }
    }

    /// 将id列表分片并逐片调用下游目标，payload为JSON编码的id列表
    pub async fn dispatch(&self, ids: &[Uuid]) -> DispatchStats {
        let mut stats = DispatchStats::default();

        for chunk in make_chunks(ids, self.chunk_size) {
            stats.chunks += 1;
            let id_strings: Vec<String> = chunk.iter().map(Uuid::to_string).collect();

            let payload = match serde_json::to_vec(&id_strings) {
                Ok(payload) => payload,
                Err(e) => {
                    error!("序列化事件id列表失败: {}", e);
                    stats.failed_chunks += 1;
                    continue;
                }
            };

            match self.invoker.invoke(&self.target, payload).await {
                Ok(()) => {
                    debug!("已分发 {} 条事件到 {}", chunk.len(), self.target);
                }
                Err(e) => {
                    error!("分发 {} 条事件到 {} 失败: {}", chunk.len(), self.target, e);
                    stats.failed_chunks += 1;
                }
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_chunks_exact_division() {
        let items: Vec<u32> = (0..400).collect();
        let chunks = make_chunks(&items, 200);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 200);
        assert_eq!(chunks[1].len(), 200);
    }

    #[test]
    fn test_make_chunks_with_remainder() {
        let items: Vec<u32> = (0..401).collect();
        let chunks = make_chunks(&items, 200);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2], vec![400]);
    }

    #[test]
    fn test_make_chunks_preserves_order() {
        let items: Vec<u32> = (0..1000).collect();
        let chunks = make_chunks(&items, 200);
        let flattened: Vec<u32> = chunks.into_iter().flatten().collect();
        assert_eq!(flattened, items);
    }

    #[test]
    fn test_make_chunks_empty_input() {
        let chunks = make_chunks::<u32>(&[], 200);
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_make_chunks_smaller_than_chunk_size() {
        let chunks = make_chunks(&[1, 2, 3], 200);
        assert_eq!(chunks, vec![vec![1, 2, 3]]);
    }
}
