//! Modbus/TCP server over real sockets, driven by the tokio-modbus client.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use plc_common::config::ModbusBacking;
use plc_common::image::{Bank, ProcessImage};
use plc_modbus::{ModbusServer, ServerError, build_store, spawn_mirror_task};
use plc_scan::ScanEngine;
use tokio_modbus::ExceptionCode;
use tokio_modbus::client::{Context, Reader, Writer, tcp};

async fn start(backing: ModbusBacking) -> (Arc<ProcessImage>, SocketAddr) {
    let image = Arc::new(ProcessImage::default());
    let (store, mirror) = build_store(backing, Arc::clone(&image));
    if let Some(mirror) = mirror {
        spawn_mirror_task(mirror, Duration::from_millis(5));
    }
    let server = ModbusServer::bind("127.0.0.1:0".parse().unwrap(), store)
        .await
        .unwrap();
    let addr = server.local_addr();
    tokio::spawn(server.serve());
    (image, addr)
}

async fn client(addr: SocketAddr) -> Context {
    tcp::connect(addr).await.unwrap()
}

#[tokio::test]
async fn reads_each_bank() {
    let (image, addr) = start(ModbusBacking::Direct).await;
    image.write_bit(Bank::BinaryOutputs, 1, true).unwrap();
    image.write_bit(Bank::BinaryInputs, 2, true).unwrap();
    image.write_word(Bank::IntegerOutputs, 0, 800).unwrap();
    image.write_word(Bank::IntegerInputs, 1, 55).unwrap();

    let mut ctx = client(addr).await;
    assert_eq!(
        ctx.read_coils(0, 4).await.unwrap().unwrap(),
        vec![false, true, false, false]
    );
    assert_eq!(
        ctx.read_discrete_inputs(0, 4).await.unwrap().unwrap(),
        vec![false, false, true, false]
    );
    assert_eq!(
        ctx.read_holding_registers(0, 2).await.unwrap().unwrap(),
        vec![800, 0]
    );
    assert_eq!(
        ctx.read_input_registers(0, 3).await.unwrap().unwrap(),
        vec![0, 55, 0]
    );
}

#[tokio::test]
async fn read_beyond_bank_is_illegal_data_address() {
    let (_image, addr) = start(ModbusBacking::Direct).await;
    let mut ctx = client(addr).await;
    let result = ctx.read_holding_registers(60, 10).await.unwrap();
    assert_eq!(result, Err(ExceptionCode::IllegalDataAddress));

    // The connection survives the exception.
    assert!(ctx.read_holding_registers(0, 1).await.unwrap().is_ok());
}

#[tokio::test]
async fn writes_land_in_live_image() {
    let (image, addr) = start(ModbusBacking::Direct).await;
    let mut ctx = client(addr).await;
    ctx.write_single_coil(3, true).await.unwrap().unwrap();
    ctx.write_multiple_registers(10, &[1, 2, 3]).await.unwrap().unwrap();
    ctx.write_single_register(4, 900).await.unwrap().unwrap();

    assert!(image.read_bit(Bank::BinaryOutputs, 3).unwrap());
    assert_eq!(image.read_words(Bank::IntegerOutputs, 10, 3).unwrap(), vec![1, 2, 3]);
    assert_eq!(image.read_word(Bank::IntegerOutputs, 4).unwrap(), 900);
}

#[tokio::test]
async fn masked_write_over_the_wire() {
    let (image, addr) = start(ModbusBacking::Direct).await;
    image.write_word(Bank::IntegerOutputs, 20, 0x12).unwrap();
    let mut ctx = client(addr).await;
    ctx.masked_write_register(20, 0xF2, 0x25).await.unwrap().unwrap();
    assert_eq!(image.read_word(Bank::IntegerOutputs, 20).unwrap(), 0x17);
}

#[tokio::test]
async fn setpoint_write_is_visible_to_next_scan() {
    let (image, addr) = start(ModbusBacking::Direct).await;
    let engine = ScanEngine::new(Arc::clone(&image), Duration::from_millis(100)).unwrap();

    // Setpoint far above the temperature: the next scan switches the heater on.
    let mut ctx = client(addr).await;
    ctx.write_single_register(4, 1000).await.unwrap().unwrap();
    engine.scan_once().unwrap();
    assert_eq!(ctx.read_coils(2, 1).await.unwrap().unwrap(), vec![true]);
    assert_eq!(ctx.read_input_registers(0, 1).await.unwrap().unwrap(), vec![802]);
}

#[tokio::test]
async fn mirrored_backing_serves_refreshed_copy() {
    let (image, addr) = start(ModbusBacking::Mirrored).await;
    let mut ctx = client(addr).await;

    ctx.write_single_coil(0, true).await.unwrap().unwrap();
    assert!(image.read_bit(Bank::BinaryOutputs, 0).unwrap());
    assert_eq!(ctx.read_coils(0, 1).await.unwrap().unwrap(), vec![true]);

    image.write_word(Bank::IntegerInputs, 0, 321).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(ctx.read_input_registers(0, 1).await.unwrap().unwrap(), vec![321]);
}

#[tokio::test]
async fn clients_are_isolated() {
    let (_image, addr) = start(ModbusBacking::Direct).await;
    let first = client(addr).await;
    drop(first);
    let mut second = client(addr).await;
    assert!(second.read_coils(0, 8).await.unwrap().is_ok());
}

#[tokio::test]
async fn bind_conflict_is_reported() {
    let (_image, addr) = start(ModbusBacking::Direct).await;
    let (store, _) = build_store(ModbusBacking::Direct, Arc::new(ProcessImage::default()));
    let err = ModbusServer::bind(addr, store).await.unwrap_err();
    assert!(matches!(err, ServerError::Bind { addr: a, .. } if a == addr));
}
