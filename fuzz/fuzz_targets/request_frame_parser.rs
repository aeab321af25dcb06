#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rtu_slave::{
    server::{storage::RegisterStore, ModbusFrame},
    RequestBuf, ResponseBuf,
};

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    unit_id: u8,
    register_count: u8,
    request_buf: RequestBuf,
}

fuzz_target!(|data: FuzzInput| {
    // we only care about panics so we can ignore results
    let _ = fuzz_server(data);
});

fn fuzz_server(input: FuzzInput) -> Result<(), rtu_slave::ErrorKind> {
    let mut response = ResponseBuf::new();
    let mut frame = ModbusFrame::new(input.unit_id, &input.request_buf, &mut response);

    if frame.parse().is_ok() {
        let mut context: RegisterStore = RegisterStore::new(input.register_count.into())?;
        let result = match frame.readonly {
            true => frame.process_read(&context),
            false => frame.process_write(&mut context),
        };
        if result.is_ok() && frame.response_required {
            frame.finalize_response()?;
        }
    }

    Ok(())
}
