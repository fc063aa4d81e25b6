// Logging sink behind the `console_log!` macro.
//
// In the browser this is `console.log`. Native builds (unit tests) have no
// JS host, so the message goes to stderr instead of a wasm import.

#[cfg(target_arch = "wasm32")]
pub fn log(s: &str) {
    web_sys::console::log_1(&wasm_bindgen::JsValue::from_str(s));
}

#[cfg(not(target_arch = "wasm32"))]
pub fn log(s: &str) {
    eprintln!("{}", s);
}

// Note: The console_log macro is defined in lib.rs to avoid duplication
