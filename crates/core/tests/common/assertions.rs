//! Custom assertion helpers over runner events.

use bb_protocol::ipc::Event;

/// Assert the overall shape of a run's events:
///
/// 1. RunStarted comes first
/// 2. JobStarted(i) is always followed by JobFinished(i) before the next job
/// 3. RunFinished comes last
#[allow(dead_code)]
pub fn assert_event_sequence(events: &[Event]) {
    assert!(
        matches!(events.first(), Some(Event::RunStarted { .. })),
        "First event should be RunStarted, got: {:?}",
        events.first()
    );
    assert!(
        matches!(events.last(), Some(Event::RunFinished { .. })),
        "Last event should be RunFinished, got: {:?}",
        events.last()
    );

    let mut open: Option<usize> = None;
    let mut next_index = 0;
    for event in events {
        match event {
            Event::JobStarted { index, .. } => {
                assert!(open.is_none(), "job {index} started while job {open:?} was running");
                assert_eq!(*index, next_index, "jobs must start in resolved order");
                open = Some(*index);
            }
            Event::JobOutput { index, .. } => {
                assert_eq!(Some(*index), open, "output outside of its job");
            }
            Event::JobFinished { index, .. } => {
                assert_eq!(Some(*index), open, "finished a job that was not running");
                open = None;
                next_index += 1;
            }
            _ => {}
        }
    }
    assert!(open.is_none(), "a job never finished");
}

#[allow(dead_code)]
pub fn count_job_started(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, Event::JobStarted { .. }))
        .count()
}

#[allow(dead_code)]
pub fn halted_remaining(events: &[Event]) -> Option<usize> {
    events.iter().find_map(|e| match e {
        Event::RunHalted { remaining } => Some(*remaining),
        _ => None,
    })
}

#[allow(dead_code)]
pub fn output_lines(events: &[Event], job: usize) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::JobOutput { index, line } if *index == job => Some(line.clone()),
            _ => None,
        })
        .collect()
}
