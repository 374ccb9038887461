//! DOM-backed checkout page

use checkout_core::{
    AnchorSource, CheckoutError, CheckoutPage, CheckoutSettings, FormField, Result,
};
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, HtmlDocument, HtmlElement, HtmlFormElement, HtmlInputElement,
    HtmlSelectElement, HtmlTextAreaElement,
};

use crate::stripe::describe;

const DISABLED: &str = "disabled";
const PROCESSING_ATTR: &str = "data-processing";

/// Checkout page over the live document.
///
/// Anchors are looked up once at construction; absent ones turn the
/// corresponding writes into no-ops.
#[derive(Debug)]
pub struct DomPage {
    document: Document,
    form: Option<HtmlFormElement>,
    error_display: Option<Element>,
    submit_button: Option<HtmlElement>,
    overlay: Option<HtmlElement>,
    save_info_id: String,
    payment_id_field_id: String,
    payment_id_field_name: String,
}

impl DomPage {
    pub fn new(document: Document, settings: &CheckoutSettings) -> Self {
        let lookup = |id: &str| document.get_element_by_id(id);

        Self {
            form: lookup(&settings.form_id).and_then(|e| e.dyn_into().ok()),
            error_display: lookup(&settings.error_display_id),
            submit_button: lookup(&settings.submit_button_id).and_then(|e| e.dyn_into().ok()),
            overlay: lookup(&settings.overlay_id).and_then(|e| e.dyn_into().ok()),
            save_info_id: settings.save_info_id.clone(),
            payment_id_field_id: settings.payment_id_field_id.clone(),
            payment_id_field_name: settings.payment_id_field_name.clone(),
            document,
        }
    }

    /// Host form, when the page has one
    pub const fn form(&self) -> Option<&HtmlFormElement> {
        self.form.as_ref()
    }

    /// Raw `document.cookie`, empty when unavailable
    pub fn cookies(&self) -> String {
        self.document
            .dyn_ref::<HtmlDocument>()
            .and_then(|doc| doc.cookie().ok())
            .unwrap_or_default()
    }

    fn payment_id_input(&self, form: &HtmlFormElement) -> Result<HtmlInputElement> {
        if let Some(existing) = self.document.get_element_by_id(&self.payment_id_field_id) {
            return existing.dyn_into::<HtmlInputElement>().map_err(|other| {
                CheckoutError::Page(format!(
                    "#{} is a <{}>, not an input",
                    self.payment_id_field_id,
                    other.tag_name().to_lowercase()
                ))
            });
        }

        let input: HtmlInputElement = self
            .document
            .create_element("input")
            .map_err(|e| page_error(&e))?
            .dyn_into()
            .map_err(|_| CheckoutError::Page("created element is not an input".into()))?;
        input.set_type("hidden");
        input.set_id(&self.payment_id_field_id);
        input.set_name(&self.payment_id_field_name);
        form.append_child(&input).map_err(|e| page_error(&e))?;
        Ok(input)
    }
}

fn page_error(value: &wasm_bindgen::JsValue) -> CheckoutError {
    CheckoutError::Page(describe(value))
}

fn control_value(element: Element) -> Option<String> {
    let element = match element.dyn_into::<HtmlInputElement>() {
        Ok(input) => return Some(input.value()),
        Err(element) => element,
    };
    let element = match element.dyn_into::<HtmlSelectElement>() {
        Ok(select) => return Some(select.value()),
        Err(element) => element,
    };
    element
        .dyn_into::<HtmlTextAreaElement>()
        .ok()
        .map(|area| area.value())
}

impl AnchorSource for DomPage {
    fn embedded_text(&self, element_id: &str) -> Option<String> {
        self.document
            .get_element_by_id(element_id)
            .and_then(|e| e.text_content())
    }

    fn has_element(&self, element_id: &str) -> bool {
        self.document.get_element_by_id(element_id).is_some()
    }

    fn report_startup_error(&self, message: &str) {
        self.set_error_message(message);
    }
}

impl CheckoutPage for DomPage {
    fn field_value(&self, field: FormField) -> Option<String> {
        self.document
            .get_element_by_id(field.element_id())
            .and_then(control_value)
    }

    fn save_info(&self) -> bool {
        self.document
            .get_element_by_id(&self.save_info_id)
            .and_then(|e| e.dyn_into::<HtmlInputElement>().ok())
            .is_some_and(|input| input.checked())
    }

    fn report_validity(&self) -> bool {
        self.form.as_ref().is_none_or(HtmlFormElement::report_validity)
    }

    fn set_error_message(&self, message: &str) {
        if let Some(display) = &self.error_display {
            display.set_text_content(Some(message));
        }
    }

    fn set_submit_enabled(&self, enabled: bool) {
        let Some(button) = &self.submit_button else {
            return;
        };

        let toggled = if enabled {
            button.remove_attribute(DISABLED)
        } else {
            button.set_attribute(DISABLED, "")
        };
        let classed = button
            .class_list()
            .toggle_with_force(DISABLED, !enabled)
            .map(|_| ());

        if let Err(err) = toggled.and(classed) {
            tracing::debug!(error = %describe(&err), "Submit control toggle failed");
        }
    }

    fn set_processing(&self, processing: bool) {
        let Some(form) = &self.form else {
            return;
        };

        let flag = if processing { "1" } else { "0" };
        if let Err(err) = form.set_attribute(PROCESSING_ATTR, flag) {
            tracing::debug!(error = %describe(&err), "Form processing flag failed");
        }
    }

    fn set_overlay_visible(&self, visible: bool) {
        let Some(overlay) = &self.overlay else {
            return;
        };

        overlay.set_hidden(!visible);
        let display = if visible { "flex" } else { "none" };
        if let Err(err) = overlay.style().set_property("display", display) {
            tracing::debug!(error = %describe(&err), "Overlay toggle failed");
        }
    }

    fn set_payment_id(&self, payment_id: &str) -> Result<()> {
        let form = self
            .form
            .as_ref()
            .ok_or_else(|| CheckoutError::Page("checkout form not found".into()))?;
        self.payment_id_input(form)?.set_value(payment_id);
        Ok(())
    }

    fn submit_form(&self) -> Result<()> {
        self.form
            .as_ref()
            .ok_or_else(|| CheckoutError::Page("checkout form not found".into()))?
            .submit()
            .map_err(|e| page_error(&e))
    }
}
