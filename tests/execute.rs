//! End-to-end execution over the wat fixtures.

use std::sync::{Arc, Mutex};

use wasmini::host::wasi::SharedWriter;
use wasmini::{Runtime, Trap, Value, WasiSnapshotPreview1};

fn runtime_of(fixture: &str) -> Runtime {
    let wasm = wat::parse_str(fixture).expect("fixture must assemble");
    Runtime::instantiate(wasm).expect("fixture must instantiate")
}

#[test]
fn add_over_sample_inputs() {
    let mut rt = runtime_of(include_str!("fixtures/func_add.wat"));
    for (a, b, want) in [(2, 3, 5), (10, 5, 15), (1, 1, 2)] {
        let got = rt.call("add", vec![Value::I32(a), Value::I32(b)]).unwrap();
        assert_eq!(got, Some(Value::I32(want)));
    }
}

#[test]
fn internal_call_doubles() {
    let mut rt = runtime_of(include_str!("fixtures/func_call.wat"));
    for (n, want) in [(2, 4), (10, 20), (1, 2)] {
        let got = rt.call("call_doubler", vec![Value::I32(n)]).unwrap();
        assert_eq!(got, Some(Value::I32(want)));
    }
}

#[test]
fn imported_function_is_dispatched() {
    let mut rt = runtime_of(include_str!("fixtures/import.wat"));
    rt.add_import("env", "add", |_, args| {
        let Some(Value::I32(x)) = args.first().copied() else {
            return Err(Trap::TypeMismatch { expected: "i32" });
        };
        Ok(Some(Value::I32(x + x)))
    });
    for (n, want) in [(2, 4), (10, 20), (1, 2)] {
        let got = rt.call("call_add", vec![Value::I32(n)]).unwrap();
        assert_eq!(got, Some(Value::I32(want)));
    }
}

#[test]
fn missing_import_function_is_reported() {
    let mut rt = runtime_of(include_str!("fixtures/import.wat"));
    rt.add_import("env", "fooooo", |_, _| Ok(None));
    let err = rt.call("call_add", vec![Value::I32(2)]).unwrap_err();
    assert_eq!(err.to_string(), "not found function: add");
}

#[test]
fn missing_import_module_is_reported() {
    let mut rt = runtime_of(include_str!("fixtures/import.wat"));
    let err = rt.call("call_add", vec![Value::I32(2)]).unwrap_err();
    assert_eq!(err.to_string(), "not found module: env");
}

#[test]
fn i32_const_returns_42() {
    let mut rt = runtime_of(include_str!("fixtures/i32_const.wat"));
    assert_eq!(rt.call("i32_const", vec![]).unwrap(), Some(Value::I32(42)));
}

#[test]
fn local_set_returns_42() {
    let mut rt = runtime_of(include_str!("fixtures/local_set.wat"));
    assert_eq!(rt.call("local_set", vec![]).unwrap(), Some(Value::I32(42)));
}

#[test]
fn i32_store_writes_memory() {
    let mut rt = runtime_of(include_str!("fixtures/i32_store.wat"));
    assert_eq!(rt.call("i32_store", vec![]).unwrap(), None);
    assert_eq!(rt.store.memories[0].data[0], 42);
}

#[test]
fn fib_sequence() {
    let mut rt = runtime_of(include_str!("fixtures/fib.wat"));
    let want = [1, 2, 3, 5, 8, 13, 21, 34, 55, 89];
    for (n, want) in (1..=10).zip(want) {
        let got = rt.call("fib", vec![Value::I32(n)]).unwrap();
        assert_eq!(got, Some(Value::I32(want)), "fib({n})");
    }
}

#[test]
fn data_segments_initialize_memory() {
    let rt = runtime_of(include_str!("fixtures/memory.wat"));
    let data = &rt.store.memories[0].data;
    assert_eq!(data.len(), 65_536);
    assert_eq!(&data[0..5], b"hello");
    assert_eq!(&data[5..10], b"world");
}

#[test]
fn unknown_export_is_reported() {
    let mut rt = runtime_of(include_str!("fixtures/func_add.wat"));
    let err = rt.call("sub", vec![]).unwrap_err();
    assert_eq!(err.to_string(), "not found export function: sub");
}

#[test]
fn hello_world_writes_through_fd_1() {
    let captured: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
    let file_table: Vec<SharedWriter> = vec![
        Arc::new(Mutex::new(std::io::sink())),
        captured.clone(),
    ];
    let wasi = WasiSnapshotPreview1::with_file_table(file_table);

    let wasm = wat::parse_str(include_str!("fixtures/hello_world.wat")).unwrap();
    let mut rt = Runtime::instantiate_with_wasi(wasm, wasi).unwrap();

    let errno = rt.call("_start", vec![]).unwrap();
    assert_eq!(errno, Some(Value::I32(0)));
    assert_eq!(&*captured.lock().unwrap(), b"Hello, World!\n");
}
