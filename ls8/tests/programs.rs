// Copyright (C) 2024 Ethan Uppal and Utku Melemetci. All rights reserved.

use std::{
    path::PathBuf,
    process::{Command, Output},
};

use ls8::{
    alu::AluError,
    loader::{self, LoadError},
    vm::{HaltReason, VM},
};

const STEP_LIMIT: u64 = 10_000;

fn program_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("programs")
        .join(name)
}

fn run_program(name: &str) -> (String, HaltReason) {
    let image =
        loader::load_file(program_path(name)).expect("program should load");
    let mut vm = VM::with_output(Vec::<u8>::new());
    vm.load(&image).expect("program should fit in memory");
    let reason = vm
        .run_for(STEP_LIMIT)
        .expect("program should run without errors");
    let output =
        String::from_utf8(vm.output().clone()).expect("output should be utf-8");
    (output, reason)
}

fn run_binary(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ls8"))
        .args(args)
        .output()
        .expect("binary should start")
}

fn run_binary_on(name: &str) -> Output {
    let path = program_path(name);
    run_binary(&[path.to_str().expect("path should be utf-8")])
}

#[test]
fn mult_prints_product() {
    assert_eq!(("72\n".to_owned(), HaltReason::Hlt), run_program("mult.ls8"));
}

#[test]
fn stack_restores_value() {
    assert_eq!(("5\n".to_owned(), HaltReason::Hlt), run_program("stack.ls8"));
}

#[test]
fn call_returns_to_caller() {
    assert_eq!(
        ("20\n40\n".to_owned(), HaltReason::Hlt),
        run_program("call.ls8")
    );
}

#[test]
fn conditional_jumps() {
    assert_eq!(
        ("1\n2\n3\n4\n".to_owned(), HaltReason::Hlt),
        run_program("sctest.ls8")
    );
}

#[test]
fn divide_by_zero_halts() {
    assert_eq!(
        (String::new(), HaltReason::Arithmetic(AluError::DivideByZero)),
        run_program("divzero.ls8")
    );
}

#[test]
fn comment_only_file_is_empty() {
    let error = loader::load_file(program_path("empty.ls8"))
        .expect_err("file has no instructions");
    assert!(matches!(error, LoadError::Empty));
}

#[test]
fn binary_runs_program() {
    let path = program_path("mult.ls8");
    let output = run_binary(&[path.to_str().expect("path should be utf-8")]);
    assert_eq!(Some(0), output.status.code());
    assert_eq!(b"72\n".as_slice(), output.stdout.as_slice());
}

#[test]
fn binary_exit_codes() {
    assert_eq!(Some(1), run_binary(&[]).status.code());
    assert_eq!(Some(1), run_binary_on("badnumber.ls8").status.code());
    assert_eq!(
        Some(2),
        run_binary(&["/nonexistent/program.ls8"]).status.code()
    );
    assert_eq!(Some(3), run_binary_on("empty.ls8").status.code());
    assert_eq!(Some(4), run_binary_on("badopcode.ls8").status.code());

    let output = run_binary_on("divzero.ls8");
    assert_eq!(Some(0), output.status.code());
    assert!(output.stdout.is_empty());
}

#[test]
fn binary_reports_each_cause_once() {
    let output = run_binary(&["/nonexistent/program.ls8"]);
    let stderr =
        String::from_utf8(output.stderr).expect("stderr should be utf-8");
    assert!(stderr.contains("couldn't open /nonexistent/program.ls8"));
    assert!(!stderr.contains('\x1b'), "piped stderr is uncolored");
    assert_eq!(1, stderr.matches("os error").count(), "{}", stderr);

    let output = run_binary_on("badopcode.ls8");
    let stderr =
        String::from_utf8(output.stderr).expect("stderr should be utf-8");
    assert!(stderr.contains("at address 0x01"), "{}", stderr);
    assert_eq!(
        1,
        stderr.matches("unknown opcode 0b11111111").count(),
        "{}",
        stderr
    );
}

#[test]
fn binary_disassembles() {
    let path = program_path("mult.ls8");
    let output = run_binary(&[
        "--disassemble",
        path.to_str().expect("path should be utf-8"),
    ]);
    assert_eq!(Some(0), output.status.code());
    assert_eq!(
        "00: LDI R0, 8\n03: LDI R1, 9\n06: MUL R0, R1\n09: PRN R0\n0B: HLT\n",
        String::from_utf8(output.stdout).expect("output should be utf-8")
    );
}
