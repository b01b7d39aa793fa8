#![no_main]

use dotpdb::metadata::customdebuginformation::{
    CdiContext, MethodRef, NullResolver, WindowsDebugInfo,
};
use dotpdb::metadata::{method::MethodBody, token::Token};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let body = MethodBody::new(vec![0, 2, 5, 9], 12).unwrap();
    let resolver = NullResolver;
    let ctx = CdiContext::new(
        MethodRef::new(Token::new(0x0600_0001), "Fuzzed"),
        &body,
        &[],
        &resolver,
    );
    let _ = WindowsDebugInfo::read(data, &ctx);
});
