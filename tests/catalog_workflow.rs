//! 目录处理流程测试
//!
//! 使用内存中的假页面和假邮件服务驱动完整的目录遍历

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio_test::assert_ok;

use archive_dispatch::error::{AppError, AppResult, BrowserError};
use archive_dispatch::services::{CatalogPage, Dispatcher, MailSender, Navigator, StateStore};
use archive_dispatch::{process_catalog, FilterField, FilterRange, ItemFlow, Pacing, RunStats};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Open(usize),
    Share(usize),
    Submit { index: usize, email: String, dry_run: bool },
    Link(usize),
    Close,
}

/// 某一次读取列表时的表现
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Listing {
    Normal,
    /// 页面还在重新渲染，脚本超时
    Timeout,
    /// 页面还在重新渲染，只读到空列表
    Empty,
    /// 浏览器已经不可用
    Gone,
}

#[derive(Default)]
struct FakePage {
    texts: Vec<String>,
    /// 依次消费；用完之后一律 `Normal`
    listings: Mutex<VecDeque<Listing>>,
    open_fails: HashSet<usize>,
    share_times_out: HashSet<usize>,
    links: HashMap<usize, String>,
    events: Mutex<Vec<Event>>,
    current: Mutex<Option<usize>>,
}

impl FakePage {
    fn new(texts: &[&str]) -> Self {
        Self {
            texts: texts.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn opened(&self) -> Vec<usize> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Open(i) => Some(i),
                _ => None,
            })
            .collect()
    }

    fn submitted(&self) -> Vec<usize> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Submit { index, .. } => Some(index),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    fn open_index(&self) -> AppResult<usize> {
        self.current
            .lock()
            .unwrap()
            .ok_or_else(|| AppError::navigation("viewer", "没有打开的条目"))
    }
}

#[async_trait]
impl CatalogPage for FakePage {
    async fn entry_texts(&self) -> AppResult<Vec<String>> {
        let listing = self
            .listings
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Listing::Normal);
        match listing {
            Listing::Normal => Ok(self.texts.clone()),
            Listing::Timeout => Err(AppError::timeout("脚本执行", 10_000)),
            Listing::Empty => Ok(Vec::new()),
            Listing::Gone => Err(BrowserError::LaunchFailed("浏览器已关闭".to_string()).into()),
        }
    }

    async fn open_entry(&self, index: usize) -> AppResult<()> {
        let mut current = self.current.lock().unwrap();
        // 上一个条目的查看器没有关闭时，列表不可用
        if current.is_some() {
            return Err(AppError::navigation("list", "查看器仍然打开"));
        }
        if self.open_fails.contains(&index) {
            return Err(AppError::timeout(format!("条目 #{}", index + 1), 10_000));
        }
        *current = Some(index);
        drop(current);
        self.push(Event::Open(index));
        Ok(())
    }

    async fn open_share(&self, index: usize) -> AppResult<()> {
        if self.share_times_out.contains(&index) {
            return Err(AppError::timeout("分享 / 下载入口", 8_000));
        }
        self.push(Event::Share(index));
        Ok(())
    }

    async fn submit_email(&self, email: &str, dry_run: bool) -> AppResult<()> {
        let index = self.open_index()?;
        self.push(Event::Submit {
            index,
            email: email.to_string(),
            dry_run,
        });
        Ok(())
    }

    async fn read_durable_link(&self) -> AppResult<String> {
        let index = self.open_index()?;
        self.push(Event::Link(index));
        Ok(self.links.get(&index).cloned().unwrap_or_default())
    }

    async fn close_view(&self) -> AppResult<()> {
        *self.current.lock().unwrap() = None;
        self.push(Event::Close);
        Ok(())
    }
}

#[derive(Clone, Default)]
struct FakeMailer {
    sent: Arc<Mutex<Vec<(String, String)>>>,
    fail_subjects: Arc<HashSet<String>>,
}

#[async_trait]
impl MailSender for FakeMailer {
    async fn send(&self, subject: &str, body: &str) -> AppResult<()> {
        if self.fail_subjects.contains(subject) {
            return Err(AppError::timeout("SMTP 服务器响应", 1_000));
        }
        self.sent
            .lock()
            .unwrap()
            .push((subject.to_string(), body.to_string()));
        Ok(())
    }
}

fn state_path(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("processed_ids.json")
}

fn read_state(path: &Path) -> BTreeMap<String, bool> {
    StateStore::load(path).entries().clone()
}

fn form_flow(dry_run: bool) -> ItemFlow {
    ItemFlow::new(Dispatcher::form("archief@example.org", dry_run))
}

async fn run(
    page: &FakePage,
    range: FilterRange,
    path: &Path,
    flow: &ItemFlow,
) -> RunStats {
    let navigator = Navigator::new(range);
    let mut state = StateStore::load(path);
    assert_ok!(process_catalog(page, &navigator, &mut state, flow, Pacing::default()).await)
}

#[tokio::test]
async fn test_entries_outside_range_are_never_opened() {
    let dir = TempDir::new().unwrap();
    let page = FakePage::new(&["399 1877 jan", "400 1878 feb", "398 1850 dec"]);
    let range = FilterRange::new(FilterField::Number, 399, 400);

    let stats = run(&page, range, &state_path(&dir), &form_flow(false)).await;

    assert_eq!(page.opened(), vec![0, 1]);
    assert_eq!(stats.matched, 2);
    assert_eq!(stats.dispatched, 2);
    assert_eq!(stats.dispatched_ids, vec!["399", "400"]);
    assert_eq!(
        read_state(&state_path(&dir)),
        BTreeMap::from([("399".to_string(), true), ("400".to_string(), true)])
    );
}

#[tokio::test]
async fn test_unparsable_entries_are_skipped_silently() {
    let dir = TempDir::new().unwrap();
    let page = FakePage::new(&["Inleiding", "399 1877 jan", "Aanvullingen"]);
    let range = FilterRange::new(FilterField::Number, 0, 99_999);

    let stats = run(&page, range, &state_path(&dir), &form_flow(false)).await;

    assert_eq!(page.opened(), vec![1]);
    assert_eq!(stats.matched, 1);
}

#[tokio::test]
async fn test_year_filter() {
    let dir = TempDir::new().unwrap();
    let page = FakePage::new(&["398 1876 dec", "399 1877 jan", "400 1878 feb"]);
    let range = FilterRange::new(FilterField::Year, 1877, 9999);

    run(&page, range, &state_path(&dir), &form_flow(false)).await;

    assert_eq!(page.opened(), vec![1, 2]);
}

#[tokio::test]
async fn test_done_entries_are_not_dispatched_again() {
    let dir = TempDir::new().unwrap();
    let path = state_path(&dir);
    fs::write(&path, r#"{"399": true}"#).unwrap();

    let page = FakePage::new(&["399 1877 jan", "400 1878 feb"]);
    let range = FilterRange::new(FilterField::Number, 399, 400);
    let stats = run(&page, range, &path, &form_flow(false)).await;

    assert_eq!(page.opened(), vec![1]);
    assert_eq!(page.submitted(), vec![1]);
    assert_eq!(stats.already_done, 1);
    assert_eq!(stats.dispatched, 1);

    // 第二次运行什么都不做
    let rerun = FakePage::new(&["399 1877 jan", "400 1878 feb"]);
    let stats = run(&rerun, range, &path, &form_flow(false)).await;
    assert!(rerun.events().is_empty());
    assert_eq!(stats.already_done, 2);
    assert_eq!(stats.attempted(), 0);
}

#[tokio::test]
async fn test_share_timeout_leaves_entry_unmarked() {
    let dir = TempDir::new().unwrap();
    let path = state_path(&dir);
    fs::write(&path, r#"{"399": true}"#).unwrap();

    let mut page = FakePage::new(&["399 1877 jan", "400 1878 feb"]);
    page.share_times_out.insert(1);
    let range = FilterRange::new(FilterField::Number, 399, 400);

    let stats = run(&page, range, &path, &form_flow(false)).await;

    assert_eq!(stats.failed, 1);
    assert_eq!(
        read_state(&path),
        BTreeMap::from([("399".to_string(), true)])
    );
    // 查看器已关闭
    assert_eq!(page.events(), vec![Event::Open(1), Event::Close]);
}

#[tokio::test]
async fn test_listing_is_usable_after_share_timeout() {
    let dir = TempDir::new().unwrap();
    let path = state_path(&dir);

    let mut page = FakePage::new(&["400 1878 feb", "401 1879 mar"]);
    page.share_times_out.insert(0);
    let range = FilterRange::new(FilterField::Number, 399, 402);

    let stats = run(&page, range, &path, &form_flow(false)).await;

    assert_eq!(stats.failed, 1);
    assert_eq!(stats.dispatched, 1);
    assert_eq!(page.submitted(), vec![1]);
    assert!(!StateStore::load(&path).is_done("400"));
    assert!(StateStore::load(&path).is_done("401"));
}

#[tokio::test]
async fn test_open_failure_skips_without_closing() {
    let dir = TempDir::new().unwrap();
    let mut page = FakePage::new(&["399 1877 jan", "400 1878 feb"]);
    page.open_fails.insert(0);
    let range = FilterRange::new(FilterField::Number, 399, 400);

    let stats = run(&page, range, &state_path(&dir), &form_flow(false)).await;

    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.dispatched, 1);
    assert_eq!(
        page.events(),
        vec![
            Event::Open(1),
            Event::Share(1),
            Event::Submit {
                index: 1,
                email: "archief@example.org".to_string(),
                dry_run: false
            },
            Event::Close,
        ]
    );
}

#[tokio::test]
async fn test_dry_run_exercises_flow_without_marking_state() {
    let dir = TempDir::new().unwrap();
    let path = state_path(&dir);
    let page = FakePage::new(&["399 1877 jan"]);
    let range = FilterRange::new(FilterField::Number, 399, 400);

    let stats = run(&page, range, &path, &form_flow(true)).await;

    assert_eq!(stats.simulated, 1);
    assert_eq!(stats.dispatched, 0);
    assert!(page.events().contains(&Event::Submit {
        index: 0,
        email: "archief@example.org".to_string(),
        dry_run: true
    }));
    assert!(read_state(&path).is_empty());
}

#[tokio::test]
async fn test_mail_dispatch_sends_title_and_link() {
    let dir = TempDir::new().unwrap();
    let path = state_path(&dir);
    let mut page = FakePage::new(&["399 1877 jan", "400 1878 feb"]);
    page.links
        .insert(0, "https://hetutrechtsarchief.nl/collectie/AAA".to_string());
    page.links
        .insert(1, "https://hetutrechtsarchief.nl/collectie/BBB".to_string());

    let mailer = FakeMailer::default();
    let flow = ItemFlow::new(Dispatcher::mail(Box::new(mailer.clone()), false));
    let range = FilterRange::new(FilterField::Number, 399, 400);

    let stats = run(&page, range, &path, &flow).await;

    assert_eq!(stats.dispatched, 2);
    assert_eq!(
        mailer.sent.lock().unwrap().clone(),
        vec![
            (
                "399 1877 jan".to_string(),
                "399 1877 jan\n\nhttps://hetutrechtsarchief.nl/collectie/AAA".to_string()
            ),
            (
                "400 1878 feb".to_string(),
                "400 1878 feb\n\nhttps://hetutrechtsarchief.nl/collectie/BBB".to_string()
            ),
        ]
    );
    assert!(page.submitted().is_empty());
}

#[tokio::test]
async fn test_mail_failure_only_fails_that_entry() {
    let dir = TempDir::new().unwrap();
    let path = state_path(&dir);
    let mut page = FakePage::new(&["399 1877 jan", "400 1878 feb"]);
    page.links.insert(0, "https://example.org/a".to_string());
    page.links.insert(1, "https://example.org/b".to_string());

    let mailer = FakeMailer {
        fail_subjects: Arc::new(HashSet::from(["399 1877 jan".to_string()])),
        ..Default::default()
    };
    let flow = ItemFlow::new(Dispatcher::mail(Box::new(mailer.clone()), false));
    let range = FilterRange::new(FilterField::Number, 399, 400);

    let stats = run(&page, range, &path, &flow).await;

    assert_eq!(stats.failed, 1);
    assert_eq!(stats.dispatched, 1);
    assert_eq!(
        read_state(&path),
        BTreeMap::from([("400".to_string(), true)])
    );
    assert_eq!(page.events().iter().filter(|e| **e == Event::Close).count(), 2);
}

#[tokio::test]
async fn test_empty_link_is_a_failure() {
    let dir = TempDir::new().unwrap();
    let path = state_path(&dir);
    let page = FakePage::new(&["399 1877 jan"]);

    let mailer = FakeMailer::default();
    let flow = ItemFlow::new(Dispatcher::mail(Box::new(mailer.clone()), false));
    let range = FilterRange::new(FilterField::Number, 399, 400);

    let stats = run(&page, range, &path, &flow).await;

    assert_eq!(stats.failed, 1);
    assert!(mailer.sent.lock().unwrap().is_empty());
    assert!(read_state(&path).is_empty());
}

#[tokio::test]
async fn test_entries_without_number_use_title_as_key() {
    let dir = TempDir::new().unwrap();
    let path = state_path(&dir);
    // 开头的数字超过五位，不算编号
    let page = FakePage::new(&["1234567 1880 register"]);
    let range = FilterRange::new(FilterField::Year, 1877, 1900);

    let stats = run(&page, range, &path, &form_flow(false)).await;

    assert_eq!(stats.dispatched_ids, vec!["1234567 1880 register"]);
    assert!(StateStore::load(&path).is_done("1234567 1880 register"));
}

impl FakePage {
    fn with_listings(self, listings: &[Listing]) -> Self {
        *self.listings.lock().unwrap() = listings.iter().copied().collect();
        self
    }
}

#[tokio::test]
async fn test_requery_timeout_is_retried() {
    let dir = TempDir::new().unwrap();
    let path = state_path(&dir);
    // 第二次读取列表（处理完 399 之后）超时一次
    let page = FakePage::new(&["399 1877 jan", "400 1878 feb"])
        .with_listings(&[Listing::Normal, Listing::Timeout]);
    let range = FilterRange::new(FilterField::Number, 399, 400);

    let stats = run(&page, range, &path, &form_flow(false)).await;

    assert_eq!(stats.dispatched, 2);
    assert!(!stats.interrupted);
    assert!(StateStore::load(&path).is_done("400"));
}

#[tokio::test]
async fn test_shrunken_listing_is_waited_for() {
    let dir = TempDir::new().unwrap();
    let path = state_path(&dir);
    let page = FakePage::new(&["399 1877 jan", "400 1878 feb"])
        .with_listings(&[Listing::Normal, Listing::Empty, Listing::Empty]);
    let range = FilterRange::new(FilterField::Number, 399, 400);

    let stats = run(&page, range, &path, &form_flow(false)).await;

    assert_eq!(page.opened(), vec![0, 1]);
    assert_eq!(stats.dispatched_ids, vec!["399", "400"]);
}

#[tokio::test]
async fn test_persistent_requery_failure_keeps_stats() {
    let dir = TempDir::new().unwrap();
    let path = state_path(&dir);
    let page = FakePage::new(&["399 1877 jan", "400 1878 feb"]).with_listings(&[
        Listing::Normal,
        Listing::Timeout,
        Listing::Timeout,
        Listing::Timeout,
    ]);
    let range = FilterRange::new(FilterField::Number, 399, 400);

    let stats = run(&page, range, &path, &form_flow(false)).await;

    assert!(stats.interrupted);
    assert_eq!(stats.dispatched, 1);
    assert_eq!(read_state(&path), BTreeMap::from([("399".to_string(), true)]));
}

#[tokio::test]
async fn test_unrecoverable_requery_error_aborts() {
    let dir = TempDir::new().unwrap();
    let path = state_path(&dir);
    let page = FakePage::new(&["399 1877 jan", "400 1878 feb"])
        .with_listings(&[Listing::Normal, Listing::Gone]);
    let navigator = Navigator::new(FilterRange::new(FilterField::Number, 399, 400));
    let mut state = StateStore::load(&path);

    let result = process_catalog(
        &page,
        &navigator,
        &mut state,
        &form_flow(false),
        Pacing::default(),
    )
    .await;

    assert!(matches!(result, Err(AppError::Browser(BrowserError::LaunchFailed(_)))));
    // 已经发送的条目仍然记录在状态文件中
    assert!(StateStore::load(&path).is_done("399"));
    assert_eq!(page.opened(), vec![0]);
}
