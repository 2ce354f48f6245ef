//! End-to-end tests driving the dispatch queue with the real OTP handler.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

use crate::config::consts::IOCTL_USBOTP_VALIDATE_OTP;
use crate::engine::{
    ControlCodeRouter, DispatchOptions, DispatchQueue, RequestHandle, RequestState, StopAck,
};
use crate::errors::{DispatchError, ErrorKind, Status};
use crate::handlers::stub::GateHandler;
use crate::handlers::{OTP_ACCEPTED, OTP_REJECTED};
use crate::observability::MemorySink;
use crate::policy::StaticCodePolicy;

const SENTINEL: u8 = 0xEE;

fn start_queue(workers: usize) -> (DispatchQueue, Arc<MemorySink>) {
    let router =
        ControlCodeRouter::otp(IOCTL_USBOTP_VALIDATE_OTP, Arc::new(StaticCodePolicy::new(123_456)));
    let sink = Arc::new(MemorySink::new());
    let queue = DispatchQueue::start(router, sink.clone(), DispatchOptions::new(workers));
    (queue, sink)
}

#[tokio::test]
async fn test_matching_code_is_accepted() {
    let (queue, _) = start_queue(2);
    let completion = queue
        .submit(IOCTL_USBOTP_VALIDATE_OTP, 123_456u32.to_le_bytes().to_vec(), vec![SENTINEL; 4])
        .unwrap()
        .wait()
        .await;

    assert_eq!(completion.result.state, RequestState::Completed);
    assert_eq!(completion.result.status, Status::SUCCESS);
    assert_eq!(completion.result.bytes_written, 4);
    assert!(completion.result.accepted());
    assert_eq!(completion.output.as_slice(), &OTP_ACCEPTED.to_le_bytes());
    assert_ne!(OTP_ACCEPTED, 0);
    queue.stop().await;
}

#[tokio::test]
async fn test_wrong_code_is_rejected_with_zero_output() {
    let (queue, _) = start_queue(2);
    let completion = queue
        .submit(IOCTL_USBOTP_VALIDATE_OTP, 1u32.to_le_bytes().to_vec(), vec![SENTINEL; 4])
        .unwrap()
        .wait()
        .await;

    assert_eq!(completion.result.state, RequestState::Completed);
    assert!(!completion.result.accepted());
    assert_eq!(completion.output.as_slice(), &OTP_REJECTED.to_le_bytes());
    assert_eq!(completion.output.write_count(), 1);
    queue.stop().await;
}

#[tokio::test]
async fn test_short_input_fails_without_touching_output() {
    let (queue, _) = start_queue(2);
    let completion = queue
        .submit(IOCTL_USBOTP_VALIDATE_OTP, vec![0x40, 0xE2], vec![SENTINEL; 4])
        .unwrap()
        .wait()
        .await;

    assert_eq!(completion.result.state, RequestState::Failed);
    assert_eq!(completion.result.error, Some(ErrorKind::BufferTooSmall));
    assert_eq!(completion.result.status, Status::BUFFER_TOO_SMALL);
    assert_eq!(completion.result.bytes_written, 0);
    assert_eq!(completion.output.as_slice(), &[SENTINEL; 4]);
    queue.stop().await;
}

#[tokio::test]
async fn test_short_output_fails_without_touching_output() {
    let (queue, _) = start_queue(1);
    let completion = queue
        .submit(IOCTL_USBOTP_VALIDATE_OTP, 123_456u32.to_le_bytes().to_vec(), vec![SENTINEL; 3])
        .unwrap()
        .wait()
        .await;

    assert_eq!(completion.result.error, Some(ErrorKind::BufferTooSmall));
    assert_eq!(completion.output.as_slice(), &[SENTINEL; 3]);
    assert_eq!(completion.output.write_count(), 0);
    queue.stop().await;
}

#[tokio::test]
async fn test_oversized_regions_use_leading_bytes_only() {
    let (queue, _) = start_queue(1);
    let mut input = 123_456u32.to_le_bytes().to_vec();
    input.extend_from_slice(&[0xFF; 12]);
    let completion = queue
        .submit(IOCTL_USBOTP_VALIDATE_OTP, input, vec![SENTINEL; 8])
        .unwrap()
        .wait()
        .await;

    assert!(completion.result.accepted());
    assert_eq!(completion.result.bytes_written, 4);
    assert_eq!(&completion.output.as_slice()[..4], &OTP_ACCEPTED.to_le_bytes());
    assert_eq!(&completion.output.as_slice()[4..], &[SENTINEL; 4]);
    queue.stop().await;
}

#[tokio::test]
async fn test_undefined_code_is_unsupported() {
    let (queue, _) = start_queue(2);
    let completion = queue
        .submit(0xFFFF, 123_456u32.to_le_bytes().to_vec(), vec![SENTINEL; 4])
        .unwrap()
        .wait()
        .await;

    assert_eq!(completion.result.state, RequestState::Failed);
    assert_eq!(completion.result.error, Some(ErrorKind::UnsupportedOperation));
    assert_eq!(completion.result.status, Status::INVALID_DEVICE_REQUEST);
    assert_eq!(completion.output.as_slice(), &[SENTINEL; 4]);
    queue.stop().await;
}

#[tokio::test]
async fn test_submit_after_stop_is_refused() {
    let (queue, sink) = start_queue(2);
    queue.stop().await;

    let err = queue
        .submit(IOCTL_USBOTP_VALIDATE_OTP, 123_456u32.to_le_bytes().to_vec(), vec![0; 4])
        .unwrap_err();
    assert_eq!(err, DispatchError::ShuttingDown);
    assert_eq!(err.status(), Status::DEVICE_NOT_READY);
    assert_eq!(sink.count("submitted"), 0);
    assert_eq!(sink.count("rejected"), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_queued_requests_never_reach_handler_after_stop() {
    const GATED: u32 = 0x0022_0010;
    let gate = GateHandler::new();
    let router = ControlCodeRouter::new().with_route(GATED, Arc::new(gate.clone()));
    let queue = Arc::new(DispatchQueue::start(
        router,
        Arc::new(MemorySink::new()),
        DispatchOptions::new(1),
    ));

    let handles: Vec<_> = (0..20)
        .map(|_| queue.submit(GATED, vec![], vec![0; 1]).unwrap())
        .collect();
    while gate.started() == 0 {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    let stopper = {
        let queue = queue.clone();
        tokio::spawn(async move { queue.stop().await })
    };
    while !queue.is_stopping() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    gate.release(20);
    let ack = stopper.await.unwrap();

    assert!(ack.is_drained());
    assert_eq!(ack.report().cancelled, 19);
    assert_eq!(ack.report().in_flight_at_stop, 1);
    assert_eq!(gate.started(), 1);
    assert_eq!(gate.finished(), 1);

    let mut cancelled = 0;
    for handle in handles {
        let completion = handle.wait().await;
        if completion.result.state == RequestState::Cancelled {
            cancelled += 1;
            assert_eq!(completion.result.status, Status::CANCELLED);
            assert_eq!(completion.output.write_count(), 0);
        }
    }
    assert_eq!(cancelled, 19);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_submissions_with_midway_stop() {
    const TOTAL: usize = 1000;
    const STOP_AFTER: usize = 500;

    let (queue, sink) = start_queue(4);
    let queue = Arc::new(queue);
    let accepted = Arc::new(AtomicUsize::new(0));
    let half_queued = Arc::new(Notify::new());

    let submitters: Vec<_> = (0..TOTAL)
        .map(|i| {
            let queue = queue.clone();
            let accepted = accepted.clone();
            let half_queued = half_queued.clone();
            tokio::spawn(async move {
                let code: u32 = if i % 2 == 0 { 123_456 } else { i as u32 };
                let submitted =
                    queue.submit(IOCTL_USBOTP_VALIDATE_OTP, code.to_le_bytes().to_vec(), vec![0; 4]);
                if submitted.is_ok() && accepted.fetch_add(1, Ordering::SeqCst) + 1 == STOP_AFTER {
                    half_queued.notify_one();
                }
                submitted
            })
        })
        .collect();

    let stopper = {
        let queue = queue.clone();
        tokio::spawn(async move {
            half_queued.notified().await;
            queue.stop().await
        })
    };

    let mut handles: Vec<RequestHandle> = Vec::new();
    let mut refused = 0;
    for submitter in submitters {
        match submitter.await.unwrap() {
            Ok(handle) => handles.push(handle),
            Err(DispatchError::ShuttingDown) => refused += 1,
            Err(other) => panic!("unexpected submit error {:?}", other),
        }
    }
    let ack = stopper.await.unwrap();
    assert!(matches!(ack, StopAck::Drained(_)));

    assert_eq!(handles.len() + refused, TOTAL);
    assert!(handles.len() >= STOP_AFTER);

    // After drain nothing accepted is left Queued or Dispatched.
    for handle in &handles {
        assert!(handle.state().is_terminal(), "{} left in {:?}", handle.id(), handle.state());
    }

    let mut finished = 0;
    for handle in handles {
        let snapshot = handle.result().unwrap();
        let completion = handle.wait().await;
        assert_eq!(completion.result, snapshot);
        match completion.result.state {
            RequestState::Completed => assert_eq!(completion.output.write_count(), 1),
            RequestState::Cancelled => assert_eq!(completion.output.write_count(), 0),
            other => panic!("unexpected terminal state {:?}", other),
        }
        finished += 1;
    }

    assert_eq!(sink.count("finished"), finished);
    assert_eq!(sink.count("rejected"), refused);
    assert_eq!(sink.count("double_completion"), 0);
    assert_eq!(ack.report().cancelled, sink.count("finished") - sink.count("dispatched"));
}
