use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use event_scheduler_core::SweeperConfig;
use event_scheduler_dispatcher::{BatchDispatcher, Sweeper};
use event_scheduler_domain::repositories::{EventCursor, EventPage};
use event_scheduler_testing_utils::{
    EventRecordBuilder, MockEventRepository, MockInvocationClient, ScriptedPageRepository,
};

fn sweeper_config(page_size: i64) -> SweeperConfig {
    SweeperConfig {
        enabled: true,
        interval_seconds: 60,
        horizon_minutes: 5,
        page_size,
    }
}

fn page_of(count: usize, with_cursor: bool) -> EventPage {
    let ids: Vec<Uuid> = (0..count).map(|_| Uuid::new_v4()).collect();
    let next_cursor = if with_cursor {
        ids.last().map(|id| EventCursor {
            date: Utc::now(),
            id: *id,
        })
    } else {
        None
    };
    EventPage { ids, next_cursor }
}

#[tokio::test]
async fn test_sweep_paginates_and_terminates() {
    // 页面脚本 [5000, 5000, 3]：第三页是短页，必须恰好3次查询
    let repository = Arc::new(ScriptedPageRepository::new(vec![
        page_of(5000, true),
        page_of(5000, true),
        page_of(3, false),
    ]));
    let invoker = Arc::new(MockInvocationClient::new());
    let dispatcher = Arc::new(BatchDispatcher::new(
        invoker.clone(),
        "schedule".to_string(),
        200,
    ));
    let sweeper = Sweeper::new(repository.clone(), dispatcher, sweeper_config(5000));

    let total = sweeper.run_once().await.unwrap();

    assert_eq!(total, 10003);
    assert_eq!(repository.query_count(), 3);

    // 每页各自分片：ceil(5000/200)*2 + ceil(3/200) = 51次调用
    assert_eq!(invoker.call_count(), 51);
    let dispatched: usize = invoker.id_list_payloads().iter().map(Vec::len).sum();
    assert_eq!(dispatched, 10003);

    // 游标严格前进，同一页不被重复加载
    let cursors = repository.recorded_cursors();
    assert_eq!(cursors[0], None);
    assert!(cursors[1].is_some());
    assert!(cursors[2].is_some());
    assert_ne!(cursors[1], cursors[2]);
}

#[tokio::test]
async fn test_sweep_stops_on_empty_first_page() {
    let repository = Arc::new(ScriptedPageRepository::new(vec![]));
    let invoker = Arc::new(MockInvocationClient::new());
    let dispatcher = Arc::new(BatchDispatcher::new(
        invoker.clone(),
        "schedule".to_string(),
        200,
    ));
    let sweeper = Sweeper::new(repository.clone(), dispatcher, sweeper_config(5000));

    let total = sweeper.run_once().await.unwrap();

    assert_eq!(total, 0);
    assert_eq!(repository.query_count(), 1);
    assert_eq!(invoker.call_count(), 0);
}

#[tokio::test]
async fn test_sweep_honors_horizon_and_status() {
    let records = vec![
        // 已过期，NEW：应分发
        EventRecordBuilder::new().due_in_seconds(-60).build(),
        // 3分钟后到期，在5分钟窗口内：应分发
        EventRecordBuilder::new().due_in_seconds(180).build(),
        // 7分钟后到期，在窗口外：不分发
        EventRecordBuilder::new().due_in_seconds(420).build(),
        // 已过期但已是SCHEDULED：不分发
        EventRecordBuilder::new().due_in_seconds(-60).scheduled().build(),
    ];
    let expected: HashSet<String> = records[..2].iter().map(|r| r.id.to_string()).collect();

    let repository = Arc::new(MockEventRepository::with_events(records));
    let invoker = Arc::new(MockInvocationClient::new());
    let dispatcher = Arc::new(BatchDispatcher::new(
        invoker.clone(),
        "schedule".to_string(),
        200,
    ));
    let sweeper = Sweeper::new(repository.clone(), dispatcher, sweeper_config(5000));

    let total = sweeper.run_once().await.unwrap();

    assert_eq!(total, 2);
    // 短页即最后一页，单次查询后终止
    assert_eq!(repository.find_call_count(), 1);

    let dispatched: HashSet<String> =
        invoker.id_list_payloads().into_iter().flatten().collect();
    assert_eq!(dispatched, expected);
}

#[tokio::test]
async fn test_sweep_pagination_has_no_overlap_or_skip() {
    let records: Vec<_> = (0..7)
        .map(|i| EventRecordBuilder::new().due_in_seconds(-600 + i * 10).build())
        .collect();
    let expected: HashSet<String> = records.iter().map(|r| r.id.to_string()).collect();

    let repository = Arc::new(MockEventRepository::with_events(records));
    let invoker = Arc::new(MockInvocationClient::new());
    let dispatcher = Arc::new(BatchDispatcher::new(
        invoker.clone(),
        "schedule".to_string(),
        200,
    ));
    let sweeper = Sweeper::new(repository.clone(), dispatcher, sweeper_config(3));

    let total = sweeper.run_once().await.unwrap();

    assert_eq!(total, 7);
    // 页面形态 [3, 3, 1]
    assert_eq!(repository.find_call_count(), 3);

    let dispatched: Vec<String> = invoker.id_list_payloads().into_iter().flatten().collect();
    assert_eq!(dispatched.len(), 7);
    assert_eq!(
        dispatched.iter().cloned().collect::<HashSet<String>>(),
        expected
    );
}

#[tokio::test]
async fn test_sweep_counts_events_even_when_dispatch_fails() {
    let records = vec![
        EventRecordBuilder::new().due_in_seconds(-60).build(),
        EventRecordBuilder::new().due_in_seconds(-30).build(),
    ];
    let repository = Arc::new(MockEventRepository::with_events(records));
    let invoker = Arc::new(MockInvocationClient::new());
    invoker.set_failing(true);
    let dispatcher = Arc::new(BatchDispatcher::new(
        invoker.clone(),
        "schedule".to_string(),
        200,
    ));
    let sweeper = Sweeper::new(repository, dispatcher, sweeper_config(5000));

    // 分发失败不致命：事件保持NEW，由下一轮扫描自愈
    let total = sweeper.run_once().await.unwrap();

    assert_eq!(total, 2);
    assert_eq!(invoker.call_count(), 1);
}
