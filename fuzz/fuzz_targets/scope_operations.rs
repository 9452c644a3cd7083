#![no_main]

use libfuzzer_sys::fuzz_target;
use scopewire::{constructor, Container, DiError};
use std::sync::Arc;

struct Counter(u8);

impl Counter {
    fn new() -> Self {
        Counter(0)
    }
}

constructor!(Counter => Counter::new());

struct Context(u8);

// Each byte is one operation against a container whose expected scope
// stack is tracked alongside.
fuzz_target!(|data: &[u8]| {
    let mut container = Container::new();
    if container.bind::<Counter>().and_then(|b| b.to_scoped::<Counter>()).is_err() {
        return;
    }

    // Context value per open frame, if the frame carries one.
    let mut frames: Vec<Option<u8>> = Vec::new();

    for &byte in data {
        match byte % 5 {
            0 => {
                container.begin_scope();
                frames.push(None);
            }
            1 => {
                container
                    .begin_scope_with_context(Arc::new(Context(byte)))
                    .expect("context type is never bound otherwise");
                frames.push(Some(byte));
            }
            2 => match container.end_scope() {
                Ok(()) => {
                    frames.pop().expect("ended a scope that was not open");
                }
                Err(DiError::NoActiveScope) => assert!(frames.is_empty()),
                Err(other) => panic!("unexpected error: {other}"),
            },
            3 => {
                let resolved = container.resolve::<Counter>();
                assert_eq!(resolved.is_ok(), !frames.is_empty());
                if let Ok(counter) = resolved {
                    assert_eq!(counter.0, 0);
                }
            }
            _ => {
                let expected = frames.last().copied().flatten();
                match (container.resolve::<Context>(), expected) {
                    (Ok(context), Some(value)) => assert_eq!(context.0, value),
                    (Err(DiError::Unregistered(_)), None) => {}
                    (result, expected) => panic!(
                        "context mismatch: resolved {:?}, expected {expected:?}",
                        result.map(|context| context.0)
                    ),
                }
            }
        }
        assert_eq!(container.scope_depth(), frames.len());
    }
});
