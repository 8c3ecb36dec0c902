// Dispatcher - 固定サイズのバッチを並行実行する

use crate::{
    core::{BatchReport, ConcurrencyResult, ProgressReporter, Task, TaskFailure, Workload},
    services::{CompletionBarrier, NoOpProgressReporter, ResultStore},
};
use futures_util::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// 固定サイズのバッチを tokio タスクとして並行実行するディスパッチャ
///
/// 各作業単位は起動前にバリアへ登録され、成否やパニックに関わらず完了時に必ず
/// `done()` する。成功した結果は [`ResultStore`] に、失敗は別のストアに蓄積され、
/// バリア解除後に [`TaskDispatcher::wait`] がまとめて返す。
pub struct TaskDispatcher<R, P = NoOpProgressReporter> {
    label: String,
    records: ResultStore<R>,
    failures: ResultStore<TaskFailure>,
    barrier: CompletionBarrier,
    reporter: Arc<P>,
    completed: Arc<AtomicUsize>,
    dispatched: usize,
    started_at: Option<Instant>,
}

impl<R> TaskDispatcher<R, NoOpProgressReporter>
where
    R: Send + 'static,
{
    /// 進捗報告なしのディスパッチャを作成
    pub fn new(label: impl Into<String>) -> Self {
        Self::with_reporter(label, Arc::new(NoOpProgressReporter::new()))
    }
}

impl<R, P> TaskDispatcher<R, P>
where
    R: Send + 'static,
    P: ProgressReporter + 'static,
{
    pub fn with_reporter(label: impl Into<String>, reporter: Arc<P>) -> Self {
        Self {
            label: label.into(),
            records: ResultStore::new(),
            failures: ResultStore::new(),
            barrier: CompletionBarrier::new(),
            reporter,
            completed: Arc::new(AtomicUsize::new(0)),
            dispatched: 0,
            started_at: None,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn barrier(&self) -> &CompletionBarrier {
        &self.barrier
    }

    /// 未完了の作業単位数
    pub fn pending(&self) -> usize {
        self.barrier.pending()
    }

    /// `[0, n)` の各IDについて `work` を並行に起動する
    ///
    /// 全件のバリア登録を済ませてから起動するため、`wait` が早期に戻ることはない。
    /// 完了はバリア経由でのみ観測できる。
    pub async fn dispatch<F, Fut>(&mut self, n: usize, work: F)
    where
        F: Fn(Task) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
    {
        let guards = self.barrier.register(n);
        self.dispatched += n;
        self.started_at.get_or_insert_with(Instant::now);
        let total = self.dispatched;

        info!(label = %self.label, tasks = n, "dispatching batch");
        self.reporter.report_started(&self.label, n).await;

        let work = Arc::new(work);
        for (id, guard) in guards.into_iter().enumerate() {
            let unit = Unit {
                task: Task::new(id),
                records: self.records.clone(),
                failures: self.failures.clone(),
                reporter: Arc::clone(&self.reporter),
                completed: Arc::clone(&self.completed),
                total,
            };
            let work = Arc::clone(&work);

            tokio::spawn(async move {
                // ガードはタスク終了時に最後に破棄される
                let _guard = guard;
                let outcome = AssertUnwindSafe(async { (*work)(unit.task).await })
                    .catch_unwind()
                    .await;
                unit.finish(outcome).await;
            });
        }
    }

    /// [`Workload`] 実装をバッチとして起動する
    pub async fn dispatch_workload<W>(&mut self, n: usize, workload: Arc<W>)
    where
        W: Workload<Output = R> + 'static,
    {
        self.dispatch(n, move |task| {
            let workload = Arc::clone(&workload);
            async move { workload.run(task).await }
        })
        .await;
    }

    /// 全作業単位の完了を待ち、結果をまとめて返す
    pub async fn wait(&mut self) -> BatchReport<R> {
        self.barrier.wait().await;
        self.collect().await
    }

    /// キャンセル可能な待機
    ///
    /// キャンセルされた場合、実行中の作業単位はそのまま走り続け、結果は次回の
    /// `wait` で回収できる。
    pub async fn wait_cancellable(
        &mut self,
        token: &CancellationToken,
    ) -> ConcurrencyResult<BatchReport<R>> {
        self.barrier.wait_cancellable(token).await?;
        Ok(self.collect().await)
    }

    async fn collect(&mut self) -> BatchReport<R> {
        // バリア解除後なので書き込み中のワーカーは存在しない
        let records = self.records.take_all().await;
        let failures = self.failures.take_all().await;
        let dispatched = std::mem::take(&mut self.dispatched);
        let elapsed = self
            .started_at
            .take()
            .map(|started| started.elapsed())
            .unwrap_or_default();
        self.completed.store(0, Ordering::Release);

        info!(
            label = %self.label,
            dispatched,
            succeeded = records.len(),
            failed = failures.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "batch completed"
        );
        self.reporter
            .report_completed(&self.label, records.len(), failures.len(), elapsed)
            .await;

        BatchReport {
            records,
            failures,
            dispatched,
            elapsed,
        }
    }
}

/// 1作業単位の後処理に必要な共有ハンドル
struct Unit<R, P> {
    task: Task,
    records: ResultStore<R>,
    failures: ResultStore<TaskFailure>,
    reporter: Arc<P>,
    completed: Arc<AtomicUsize>,
    total: usize,
}

impl<R, P> Unit<R, P>
where
    R: Send + 'static,
    P: ProgressReporter,
{
    async fn finish(self, outcome: Result<anyhow::Result<R>, Box<dyn Any + Send>>) {
        match outcome {
            Ok(Ok(record)) => {
                self.records.append(record).await;
                debug!(task = self.task.id, "unit of work completed");
            }
            Ok(Err(error)) => self.fail(format!("{error:#}")).await,
            Err(payload) => {
                self.fail(format!("panicked: {}", panic_message(payload.as_ref())))
                    .await
            }
        }

        let completed = self.completed.fetch_add(1, Ordering::AcqRel) + 1;
        self.reporter.report_progress(completed, self.total).await;
    }

    async fn fail(&self, reason: String) {
        warn!(task = self.task.id, %reason, "unit of work failed");
        self.reporter.report_error(self.task, &reason).await;
        self.failures
            .append(TaskFailure {
                task: self.task,
                reason,
            })
            .await;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::{MockProgressReporter, MockWorkload};
    use crate::services::RecordingQuery;
    use std::collections::HashSet;
    use std::time::Duration;
    use tokio::time::timeout;

    fn id_worker(task: Task) -> impl Future<Output = anyhow::Result<String>> {
        async move {
            tokio::task::yield_now().await;
            Ok(format!("id{}", task.id))
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_dispatch_five_id_workers() {
        let mut dispatcher = TaskDispatcher::new("ids");
        dispatcher.dispatch(5, id_worker).await;

        let report = timeout(Duration::from_secs(5), dispatcher.wait())
            .await
            .unwrap();

        assert_eq!(report.dispatched, 5);
        assert!(report.is_success());
        let records: HashSet<_> = report.records.into_iter().collect();
        let expected: HashSet<_> = (0..5).map(|i| format!("id{i}")).collect();
        assert_eq!(records, expected);
        assert_eq!(dispatcher.pending(), 0);
    }

    #[tokio::test]
    async fn test_dispatch_zero_tasks() {
        let mut dispatcher = TaskDispatcher::new("empty");
        dispatcher.dispatch(0, id_worker).await;

        let report = timeout(Duration::from_millis(100), dispatcher.wait())
            .await
            .unwrap();
        assert_eq!(report.dispatched, 0);
        assert!(report.records.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_repeated_batches_never_lose_records() {
        let mut dispatcher = TaskDispatcher::new("repeat");

        for _ in 0..10 {
            dispatcher.dispatch(50, id_worker).await;
            let report = dispatcher.wait().await;

            assert_eq!(report.records.len(), 50);
            let unique: HashSet<_> = report.records.iter().collect();
            assert_eq!(unique.len(), 50);
            assert_eq!(dispatcher.pending(), 0);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_failures_still_clear_barrier_and_are_aggregated() {
        let mut dispatcher = TaskDispatcher::new("mixed");
        dispatcher
            .dispatch(6, |task: Task| async move {
                match task.id % 3 {
                    0 => anyhow::bail!("query {} failed", task.id),
                    1 => panic!("worker {} crashed", task.id),
                    _ => Ok(task.id),
                }
            })
            .await;

        let report = timeout(Duration::from_secs(5), dispatcher.wait())
            .await
            .expect("失敗やパニックがあってもバリアは解除されるべきです");

        assert_eq!(report.dispatched, 6);
        let mut records = report.records.clone();
        records.sort_unstable();
        assert_eq!(records, vec![2, 5]);

        let mut failures = report.failures.clone();
        failures.sort_by_key(|failure| failure.task);
        assert_eq!(failures.len(), 4);
        assert_eq!(failures[0].reason, "query 0 failed");
        assert_eq!(failures[1].reason, "panicked: worker 1 crashed");

        assert!(report.into_result().is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_dispatch_workload_with_mock() {
        let mut workload = MockWorkload::new();
        workload
            .expect_run()
            .times(3)
            .returning(|task| Ok(format!("mock{}", task.id)));

        let mut dispatcher = TaskDispatcher::new("mock");
        dispatcher.dispatch_workload(3, Arc::new(workload)).await;
        let report = dispatcher.wait().await;

        let mut records = report.into_result().unwrap();
        records.sort();
        assert_eq!(records, vec!["mock0", "mock1", "mock2"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_dispatch_recording_query() {
        let workload = Arc::new(RecordingQuery::new(
            ["id1", "id2", "id3", "id4", "id5"],
            Duration::from_millis(5),
        ));
        let mut dispatcher = TaskDispatcher::new("collect");
        dispatcher.dispatch_workload(5, workload).await;

        let report = dispatcher.wait().await;
        let records: HashSet<_> = report.records.iter().map(String::as_str).collect();
        assert_eq!(records, HashSet::from(["id1", "id2", "id3", "id4", "id5"]));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_reporter_receives_lifecycle_events() {
        let mut reporter = MockProgressReporter::new();
        reporter
            .expect_report_started()
            .withf(|label, total| label.to_string() == "tracked" && *total == 3)
            .times(1)
            .return_const(());
        reporter.expect_report_progress().times(3).return_const(());
        reporter
            .expect_report_error()
            .withf(|task, _| task.id == 1)
            .times(1)
            .return_const(());
        reporter
            .expect_report_completed()
            .withf(|label, succeeded, failed, _| {
                label.to_string() == "tracked" && *succeeded == 2 && *failed == 1
            })
            .times(1)
            .return_const(());

        let mut dispatcher = TaskDispatcher::with_reporter("tracked", Arc::new(reporter));
        dispatcher
            .dispatch(3, |task: Task| async move {
                if task.id == 1 {
                    anyhow::bail!("boom");
                }
                Ok(task.id)
            })
            .await;
        dispatcher.wait().await;
    }

    #[tokio::test]
    async fn test_wait_cancellable() {
        let mut dispatcher = TaskDispatcher::new("slow");
        dispatcher
            .dispatch(1, |task: Task| async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok::<_, anyhow::Error>(task.id)
            })
            .await;

        let token = CancellationToken::new();
        token.cancel();
        assert!(dispatcher.wait_cancellable(&token).await.is_err());
        assert_eq!(dispatcher.pending(), 1);

        let live = CancellationToken::new();
        let report = dispatcher.wait_cancellable(&live).await.unwrap();
        assert_eq!(report.records, vec![0]);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(payload.as_ref()), "static message");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(panic_message(payload.as_ref()), "owned message");

        let payload: Box<dyn Any + Send> = Box::new(42);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic payload");
    }
}
