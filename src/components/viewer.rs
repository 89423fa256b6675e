use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{
    AddEventListenerOptions, Blob, CanvasRenderingContext2d, Document, HtmlCanvasElement,
    HtmlImageElement, TouchEvent, TouchList, Url, Window,
};
use yew::prelude::*;

use crate::geometry::{self, SurfaceBox};
use crate::model::{ImageDimension, Point, VIEW_MARGIN, Viewport};
use crate::state::{GestureEnd, GestureState};
use crate::util::clog;

#[derive(Properties, PartialEq, Clone)]
pub struct CanvasImageProps {
    pub image: Blob,
    #[prop_or_default]
    pub on_pan_end: Callback<()>,
    #[prop_or_default]
    pub on_zoom_end: Callback<()>,
}

/// Touch listeners plus the document-level native-gesture suppressor, kept
/// alive together and removed together on teardown.
struct TouchListeners {
    touch_start: Closure<dyn FnMut(TouchEvent)>,
    touch_move: Closure<dyn FnMut(TouchEvent)>,
    touch_end: Closure<dyn FnMut(TouchEvent)>,
    gesture_start: Closure<dyn FnMut(web_sys::Event)>,
}

/// Full-viewport canvas that pans and pinch-zooms the given image blob.
///
/// Binding lifecycle: each image change decodes the blob into an
/// `HtmlImageElement`, resets the gesture state, computes the fit scale,
/// sizes the canvas to the viewport, attaches the touch listeners once and
/// starts the animation-frame loop. Teardown (unmount or next image) cancels
/// the pending frame and detaches every listener.
#[function_component(CanvasImage)]
pub fn canvas_image(props: &CanvasImageProps) -> Html {
    let canvas_ref = use_node_ref();
    let session = use_mut_ref(GestureState::default);
    let image_size = use_mut_ref(ImageDimension::default);
    let image_el = use_mut_ref(|| None::<HtmlImageElement>);

    {
        let canvas_ref = canvas_ref.clone();
        let session = session.clone();
        let image_size = image_size.clone();
        let image_el = image_el.clone();
        let on_pan_end = props.on_pan_end.clone();
        let on_zoom_end = props.on_zoom_end.clone();
        use_effect_with(props.image.clone(), move |image| {
            let window = web_sys::window().expect("no global `window` exists");
            let raf_id: Rc<RefCell<Option<i32>>> = Rc::new(RefCell::new(None));
            let raf_closure: Rc<RefCell<Option<Closure<dyn FnMut()>>>> =
                Rc::new(RefCell::new(None));
            let listeners: Rc<RefCell<Option<TouchListeners>>> = Rc::new(RefCell::new(None));
            let pending_image: Rc<RefCell<Option<HtmlImageElement>>> = Rc::new(RefCell::new(None));

            if let (Some(canvas), Ok(img), Ok(url)) = (
                canvas_ref.cast::<HtmlCanvasElement>(),
                HtmlImageElement::new(),
                Url::create_object_url_with_blob(image),
            ) {
                clog("CanvasImage: binding image");
                let viewport = viewport_size(&window);
                let onload = Closure::once_into_js({
                    let window = window.clone();
                    let img = img.clone();
                    let session = session.clone();
                    let image_size = image_size.clone();
                    let image_el = image_el.clone();
                    let raf_id = raf_id.clone();
                    let raf_closure = raf_closure.clone();
                    let listeners = listeners.clone();
                    move || {
                        let size = ImageDimension {
                            width: img.natural_width() as f64,
                            height: img.natural_height() as f64,
                        };
                        clog("CanvasImage: image ready, resetting view state");
                        {
                            let mut st = session.borrow_mut();
                            st.reset();
                            st.scale = geometry::fit_scale(size, viewport, VIEW_MARGIN);
                        }
                        *image_size.borrow_mut() = size;
                        *image_el.borrow_mut() = Some(img.clone());
                        size_canvas(&canvas, viewport);
                        // Attach-once guard: a re-entrant bind before teardown
                        // must not stack a second set of listeners.
                        if listeners.borrow().is_none() {
                            *listeners.borrow_mut() = attach_listeners(
                                &canvas,
                                window.document(),
                                session.clone(),
                                image_size.clone(),
                                viewport,
                                on_pan_end,
                                on_zoom_end,
                            );
                        }
                        start_render_loop(
                            &window,
                            canvas,
                            session,
                            image_size,
                            image_el,
                            viewport,
                            raf_id,
                            raf_closure,
                        );
                    }
                });
                img.set_onload(Some(onload.unchecked_ref()));
                img.set_src(&url);
                *pending_image.borrow_mut() = Some(img);
            }

            let cleanup_canvas = canvas_ref.cast::<HtmlCanvasElement>();
            move || {
                // A frame scheduled for this binding must never fire after
                // the state it reads has been torn down.
                if let Some(id) = raf_id.borrow_mut().take() {
                    let _ = window.cancel_animation_frame(id);
                }
                raf_closure.borrow_mut().take();
                if let Some(img) = pending_image.borrow_mut().take() {
                    img.set_onload(None);
                }
                if let Some(ls) = listeners.borrow_mut().take() {
                    clog("CanvasImage: removing listeners");
                    remove_listeners(&ls, cleanup_canvas.as_ref(), window.document());
                }
            }
        });
    }

    html! {
        <div style="width:100%; height:100%; position:relative; box-sizing:border-box;">
            <canvas
                ref={canvas_ref}
                style="width:100%; height:100%; position:absolute; left:0; top:0; box-sizing:border-box; touch-action:none;"
            />
        </div>
    }
}

fn viewport_size(window: &Window) -> Viewport {
    let width = window
        .inner_width()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(800.0);
    let height = window
        .inner_height()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(600.0);
    Viewport { width, height }
}

fn size_canvas(canvas: &HtmlCanvasElement, viewport: Viewport) {
    canvas.set_width(viewport.width as u32);
    canvas.set_height(viewport.height as u32);
    let style = canvas.style();
    let _ = style.set_property("width", &format!("{}px", viewport.width));
    let _ = style.set_property("height", &format!("{}px", viewport.height));
}

/// Viewport-relative point to surface-local pixels. Defined fallback: an
/// unmounted surface maps everything to the zero point.
fn to_surface_local(client: Point, canvas: Option<&HtmlCanvasElement>) -> Point {
    match canvas {
        Some(canvas) => {
            let rect = canvas.get_bounding_client_rect();
            geometry::surface_local(
                client,
                SurfaceBox {
                    left: rect.left(),
                    top: rect.top(),
                    width: rect.width(),
                    height: rect.height(),
                },
                Viewport {
                    width: canvas.width() as f64,
                    height: canvas.height() as f64,
                },
            )
        }
        None => Point::ZERO,
    }
}

fn touch_points(list: &TouchList, canvas: &HtmlCanvasElement) -> Vec<Point> {
    (0..list.length())
        .filter_map(|i| list.item(i))
        .map(|t| {
            to_surface_local(
                Point {
                    x: t.client_x() as f64,
                    y: t.client_y() as f64,
                },
                Some(canvas),
            )
        })
        .collect()
}

fn attach_listeners(
    canvas: &HtmlCanvasElement,
    document: Option<Document>,
    session: Rc<RefCell<GestureState>>,
    image_size: Rc<RefCell<ImageDimension>>,
    viewport: Viewport,
    on_pan_end: Callback<()>,
    on_zoom_end: Callback<()>,
) -> Option<TouchListeners> {
    clog("CanvasImage: attaching listeners");
    let opts = AddEventListenerOptions::new();
    opts.set_passive(false);

    let touch_start = {
        let canvas = canvas.clone();
        let session = session.clone();
        let image_size = image_size.clone();
        Closure::wrap(Box::new(move |e: TouchEvent| {
            e.prevent_default();
            let touches = touch_points(&e.touches(), &canvas);
            session
                .borrow_mut()
                .on_touch_start(&touches, *image_size.borrow(), viewport);
        }) as Box<dyn FnMut(_)>)
    };
    let touch_move = {
        let canvas = canvas.clone();
        let session = session.clone();
        Closure::wrap(Box::new(move |e: TouchEvent| {
            e.prevent_default();
            let active = touch_points(&e.touches(), &canvas);
            session
                .borrow_mut()
                .on_touch_move(&active, e.changed_touches().length() as usize);
        }) as Box<dyn FnMut(_)>)
    };
    let touch_end = {
        let session = session.clone();
        Closure::wrap(Box::new(move |e: TouchEvent| {
            e.prevent_default();
            let remaining = e.touches().length() as usize;
            match session.borrow_mut().on_touch_end(remaining) {
                Some(GestureEnd::Pan) => on_pan_end.emit(()),
                Some(GestureEnd::Zoom) => on_zoom_end.emit(()),
                None => {}
            }
        }) as Box<dyn FnMut(_)>)
    };
    // Keeps Safari's native pinch-zoom from double-handling the gesture.
    let gesture_start = Closure::wrap(Box::new(move |e: web_sys::Event| {
        e.prevent_default();
        e.stop_immediate_propagation();
    }) as Box<dyn FnMut(_)>);

    canvas
        .add_event_listener_with_callback_and_add_event_listener_options(
            "touchstart",
            touch_start.as_ref().unchecked_ref(),
            &opts,
        )
        .ok();
    canvas
        .add_event_listener_with_callback_and_add_event_listener_options(
            "touchmove",
            touch_move.as_ref().unchecked_ref(),
            &opts,
        )
        .ok();
    canvas
        .add_event_listener_with_callback_and_add_event_listener_options(
            "touchend",
            touch_end.as_ref().unchecked_ref(),
            &opts,
        )
        .ok();
    if let Some(document) = document {
        document
            .add_event_listener_with_callback_and_add_event_listener_options(
                "gesturestart",
                gesture_start.as_ref().unchecked_ref(),
                &opts,
            )
            .ok();
    }

    Some(TouchListeners {
        touch_start,
        touch_move,
        touch_end,
        gesture_start,
    })
}

fn remove_listeners(
    listeners: &TouchListeners,
    canvas: Option<&HtmlCanvasElement>,
    document: Option<Document>,
) {
    if let Some(canvas) = canvas {
        let _ = canvas.remove_event_listener_with_callback(
            "touchstart",
            listeners.touch_start.as_ref().unchecked_ref(),
        );
        let _ = canvas.remove_event_listener_with_callback(
            "touchmove",
            listeners.touch_move.as_ref().unchecked_ref(),
        );
        let _ = canvas.remove_event_listener_with_callback(
            "touchend",
            listeners.touch_end.as_ref().unchecked_ref(),
        );
    }
    if let Some(document) = document {
        let _ = document.remove_event_listener_with_callback(
            "gesturestart",
            listeners.gesture_start.as_ref().unchecked_ref(),
        );
    }
}

#[allow(clippy::too_many_arguments)]
fn start_render_loop(
    window: &Window,
    canvas: HtmlCanvasElement,
    session: Rc<RefCell<GestureState>>,
    image_size: Rc<RefCell<ImageDimension>>,
    image_el: Rc<RefCell<Option<HtmlImageElement>>>,
    viewport: Viewport,
    raf_id: Rc<RefCell<Option<i32>>>,
    raf_closure: Rc<RefCell<Option<Closure<dyn FnMut()>>>>,
) {
    // At most one scheduled frame is pending at a time.
    if let Some(id) = raf_id.borrow_mut().take() {
        let _ = window.cancel_animation_frame(id);
    }
    clog("CanvasImage: render loop started");
    let closure_cell = raf_closure.clone();
    let raf_id_loop = raf_id.clone();
    let window_loop = window.clone();
    *raf_closure.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        draw_frame(&canvas, &session, &image_size, &image_el, viewport);
        if let Ok(id) = window_loop.request_animation_frame(
            closure_cell
                .borrow()
                .as_ref()
                .unwrap()
                .as_ref()
                .unchecked_ref(),
        ) {
            *raf_id_loop.borrow_mut() = Some(id);
        }
    }) as Box<dyn FnMut()>));
    if let Ok(id) = window.request_animation_frame(
        raf_closure
            .borrow()
            .as_ref()
            .unwrap()
            .as_ref()
            .unchecked_ref(),
    ) {
        *raf_id.borrow_mut() = Some(id);
    }
}

/// One frame: skip when not ready or settled, otherwise clear and repaint
/// the image at the current transform.
fn draw_frame(
    canvas: &HtmlCanvasElement,
    session: &Rc<RefCell<GestureState>>,
    image_size: &Rc<RefCell<ImageDimension>>,
    image_el: &Rc<RefCell<Option<HtmlImageElement>>>,
    viewport: Viewport,
) {
    if !canvas.is_connected() {
        return;
    }
    let image_ref = image_el.borrow();
    let Some(image) = image_ref.as_ref() else {
        return;
    };
    let ctx = match canvas.get_context("2d").ok().flatten() {
        Some(c) => match c.dyn_into::<CanvasRenderingContext2d>() {
            Ok(c) => c,
            Err(_) => return,
        },
        None => return,
    };
    let size = *image_size.borrow();
    let first = !session.borrow().has_drawn();
    let Some(rect) = session.borrow_mut().frame(size, viewport) else {
        return;
    };
    if first {
        clog("CanvasImage: first draw");
    }
    ctx.clear_rect(0.0, 0.0, canvas.width() as f64, canvas.height() as f64);
    let _ = ctx.draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
        image,
        0.0,
        0.0,
        size.width,
        size.height,
        rect.x,
        rect.y,
        rect.width,
        rect.height,
    );
}
