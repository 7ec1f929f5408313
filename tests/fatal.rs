//! Fatal misuse ends the process, so each case re-runs this test binary as a
//! child and inspects how it exited.

use std::{env, process::Command};

use rheap::{Allocator, Handle};

const CHILD: &str = "RHEAP_FATAL_CHILD";

fn run_child(test: &str) -> (Option<i32>, String) {
  let output = Command::new(env::current_exe().unwrap())
    .args([test, "--exact", "--nocapture", "--test-threads=1"])
    .env(CHILD, "1")
    .output()
    .unwrap();

  (output.status.code(), String::from_utf8_lossy(&output.stderr).into_owned())
}

fn in_child() -> bool {
  env::var_os(CHILD).is_some()
}

#[test]
fn double_free_terminates() {
  if in_child() {
    let mut allocator = Allocator::new();
    allocator.initialize(0).unwrap();
    let handle = allocator.allocate(16);
    allocator.deallocate(handle);
    allocator.deallocate(handle);
    unreachable!("second free returned");
  }

  let (code, stderr) = run_child("double_free_terminates");
  assert_eq!(code, Some(1));
  assert!(stderr.contains("Attempt to free unallocated chunk"), "{stderr}");
}

#[test]
fn null_free_terminates() {
  if in_child() {
    let mut allocator = Allocator::new();
    allocator.initialize(0).unwrap();
    allocator.deallocate(None);
    unreachable!("null free returned");
  }

  let (code, stderr) = run_child("null_free_terminates");
  assert_eq!(code, Some(1));
  assert!(stderr.contains("Attempt to free unallocated chunk"), "{stderr}");
}

#[test]
fn free_of_unallocated_offset_terminates() {
  if in_child() {
    let mut allocator = Allocator::new();
    allocator.initialize(0).unwrap();
    allocator.allocate(100).unwrap();
    allocator.deallocate(Some(Handle::from_offset(60)));
    unreachable!("bogus free returned");
  }

  let (code, _) = run_child("free_of_unallocated_offset_terminates");
  assert_eq!(code, Some(1));
}

#[test]
fn free_without_heap_terminates() {
  if in_child() {
    Allocator::new().deallocate(Some(Handle::from_offset(8)));
    unreachable!("free without heap returned");
  }

  let (code, _) = run_child("free_without_heap_terminates");
  assert_eq!(code, Some(1));
}
