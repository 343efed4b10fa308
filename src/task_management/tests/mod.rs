use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use web_time::Instant;

use super::{task::Task, TaskManager, MAX_TASKS_IN_FLIGHT};

struct CountingTask {
    counter: Arc<AtomicUsize>,
}

impl Task for CountingTask {
    fn label(&self) -> String {
        "count".to_string()
    }

    fn process(self: Box<Self>) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }
}

struct PanickingTask;

impl Task for PanickingTask {
    fn label(&self) -> String {
        "explode".to_string()
    }

    fn process(self: Box<Self>) {
        panic!("task failure");
    }
}

fn drain(task_manager: &mut TaskManager) -> usize {
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut reports = 0;
    while !task_manager.is_idle() {
        assert!(Instant::now() < deadline, "tasks did not finish in time");
        reports += task_manager.process_completed_tasks().len();
        task_manager.process_queued_tasks();
        std::thread::sleep(Duration::from_millis(1));
    }
    reports
}

#[test]
fn every_published_task_runs_once() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut task_manager = TaskManager::new(3).unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    for _ in 0..50 {
        task_manager.publish_task(Box::new(CountingTask {
            counter: counter.clone(),
        }));
    }

    assert!(task_manager.tasks_in_flight() <= 3 * MAX_TASKS_IN_FLIGHT);
    assert_eq!(drain(&mut task_manager), 50);
    assert_eq!(counter.load(Ordering::SeqCst), 50);
}

#[test]
fn busy_workers_queue_new_tasks() {
    let mut task_manager = TaskManager::new(1).unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    assert!(task_manager.publish_task(Box::new(CountingTask {
        counter: counter.clone(),
    })));
    assert!(!task_manager.publish_task(Box::new(CountingTask {
        counter: counter.clone(),
    })));
    assert_eq!(task_manager.queued_task_count(), 1);

    drain(&mut task_manager);
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[test]
fn a_panicking_task_does_not_take_down_its_worker() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut task_manager = TaskManager::new(1).unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    task_manager.publish_task(Box::new(PanickingTask));
    task_manager.publish_task(Box::new(CountingTask {
        counter: counter.clone(),
    }));

    drain(&mut task_manager);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn zero_workers_never_run_anything() {
    let mut task_manager = TaskManager::new(0).unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    assert!(!task_manager.publish_task(Box::new(CountingTask { counter })));
    task_manager.process_queued_tasks();
    assert!(!task_manager.is_idle());
    assert!(task_manager.process_completed_tasks().is_empty());
}
