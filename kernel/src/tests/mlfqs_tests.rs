//! MLFQS policy end to end

use super::*;
use crate::scheduler::fixed_point::FixedPoint;
use crate::scheduler::thread::{NICE_MAX, PRI_MAX};

#[test]
fn test_new_threads_start_at_top_priority() {
    let sched = boot_started(SchedConfig::mlfqs());
    assert_eq!(sched.current_priority(), PRI_MAX);

    let a = sched.thread_create("a", 10, noop, 0).unwrap();
    assert_eq!(priority_of(&sched, a), PRI_MAX);
    // Equal priority: the creator keeps the CPU
    assert_eq!(sched.current_tid(), 1);
}

#[test]
fn test_set_priority_is_ignored() {
    let sched = boot_started(SchedConfig::mlfqs());
    sched.set_priority(5);
    assert_eq!(sched.current_priority(), PRI_MAX);
}

#[test]
fn test_load_avg_after_one_second() {
    let sched = boot_started(SchedConfig::mlfqs());
    for _ in 0..100 {
        timer_tick(&sched);
    }
    assert_eq!(sched.load_avg(), FixedPoint::int_div_int(1, 60));
    assert_eq!(sched.load_avg_x100(), 1);

    // Priority recomputed from 100 ticks of CPU, then recent_cpu decayed
    assert_eq!(sched.current_priority(), 38);
    assert_eq!(sched.recent_cpu_x100(), 322);
}

#[test]
fn test_idle_is_not_charged() {
    let sched = boot_started(SchedConfig::mlfqs());
    let idle = sched.idle_tid().unwrap();
    sched.sleep_for(50);
    assert_eq!(sched.current_tid(), idle);

    for _ in 0..8 {
        timer_tick(&sched);
    }
    assert_eq!(sched.with_thread(idle, |t| t.recent_cpu()), Some(FixedPoint::ZERO));
    assert_eq!(sched.tick_stats().idle_ticks, 8);
}

#[test]
fn test_set_nice_yields_when_outranked() {
    let sched = boot_started(SchedConfig::mlfqs());
    let a = sched.thread_create("a", 10, noop, 0).unwrap();

    sched.set_nice(5);
    assert_eq!(sched.current_tid(), a);
    assert_eq!(priority_of(&sched, 1), PRI_MAX - 10);

    // Clamped to NICE_MAX, now below main
    sched.set_nice(100);
    assert_eq!(sched.current_tid(), 1);
    assert_eq!(sched.with_thread(a, |t| t.nice()), Some(NICE_MAX));
    assert_eq!(priority_of(&sched, a), PRI_MAX - 2 * NICE_MAX);
}

#[test]
fn test_set_nice_alone_never_yields() {
    let sched = boot_started(SchedConfig::mlfqs());
    sched.set_nice(20);
    assert_eq!(sched.current_tid(), 1);
    assert_eq!(sched.current_nice(), 20);
    assert_eq!(sched.current_priority(), PRI_MAX - 40);
    assert_eq!(sched.tick_stats().yields, 0);
}

#[test]
fn test_busy_thread_drops_below_fresh_one() {
    let sched = boot_started(SchedConfig::mlfqs());
    for _ in 0..8 {
        timer_tick(&sched);
    }
    // 8 ticks charged: 63 - 8/4
    assert_eq!(sched.current_priority(), 61);

    let fresh = sched.thread_create("fresh", 0, noop, 0).unwrap();
    assert_eq!(sched.current_tid(), fresh);
}

#[test]
fn test_recent_cpu_report_for_starved_thread() {
    let sched = boot_started(SchedConfig::mlfqs());
    // Settled value of a nice-20 thread under a load average near 35
    sched.with_current(|t| t.set_recent_cpu(FixedPoint::from_int(1420)));
    assert_eq!(sched.recent_cpu_x100(), 142_000);
}
