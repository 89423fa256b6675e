use web_sys::{Blob, HtmlInputElement};
use yew::prelude::*;

use super::viewer::CanvasImage;
use crate::util::{clog, read_image_blob};

/// App shell: a file picker that feeds the chosen image into the viewer.
/// The viewer only mounts once a blob is available.
#[function_component(App)]
pub fn app() -> Html {
    let image_data = use_state(|| None::<Blob>);

    let on_file_change = {
        let image_data = image_data.clone();
        Callback::from(move |e: Event| {
            let Some(input) = e.target_dyn_into::<HtmlInputElement>() else {
                return;
            };
            let Some(file) = input.files().and_then(|files| files.item(0)) else {
                return;
            };
            let image_data = image_data.clone();
            read_image_blob(&file, move |blob| image_data.set(Some(blob)));
            // Allow re-picking the same file to trigger another change event.
            input.set_value("");
        })
    };

    let on_pan_end = Callback::from(|_| clog("CanvasImage: pan ended"));
    let on_zoom_end = Callback::from(|_| clog("CanvasImage: zoom ended"));

    html! {
        <div style="height:100vh; overflow:hidden; position:relative;">
            <div style="width:230px; overflow:hidden; position:absolute; top:5px; right:5px; z-index:11;">
                <input type="file" accept="image/*" onchange={on_file_change} />
            </div>
            {
                if let Some(blob) = (*image_data).clone() {
                    html! { <CanvasImage image={blob} on_pan_end={on_pan_end} on_zoom_end={on_zoom_end} /> }
                } else {
                    html! {}
                }
            }
        </div>
    }
}
