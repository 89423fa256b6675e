use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Blob, BlobPropertyBag, File, FileReader};

pub fn clog(msg: &str) {
    web_sys::console::log_1(&JsValue::from_str(msg));
}

/// Reads a picked file into a typed `Blob` and hands it to `on_ready` once
/// the read completes. A file that cannot be read simply never produces a
/// blob; the caller stays in its "waiting for load" state.
pub fn read_image_blob(file: &File, on_ready: impl FnOnce(Blob) + 'static) {
    let Ok(reader) = FileReader::new() else {
        return;
    };
    let mime = file.type_();
    let onload = {
        let reader = reader.clone();
        Closure::once_into_js(move |_: web_sys::ProgressEvent| {
            let Ok(buffer) = reader.result() else {
                return;
            };
            let bytes = js_sys::Uint8Array::new(&buffer);
            let parts = js_sys::Array::of1(&bytes.into());
            let options = BlobPropertyBag::new();
            options.set_type(&mime);
            if let Ok(blob) = Blob::new_with_u8_array_sequence_and_options(&parts, &options) {
                on_ready(blob);
            }
        })
    };
    reader.set_onload(Some(onload.unchecked_ref()));
    let _ = reader.read_as_array_buffer(file);
}
