//! Small interaction helpers shared by the providers.

use chromiumoxide::page::Page;

use crate::core::ScrapeResult;

/// Fills `selector` and submits with Enter. The click first gives the input
/// focus; both search boxes attach their handlers on focus.
pub async fn fill_and_submit(page: &Page, selector: &str, value: &str) -> ScrapeResult<()> {
    let element = page.find_element(selector).await?;
    element
        .click()
        .await?
        .type_str(value)
        .await?
        .press_key("Enter")
        .await?;
    Ok(())
}

/// `querySelector(..)?.click()` fallback for elements that swallow synthetic
/// CDP clicks. Selector must be a literal; none of ours carry quotes.
pub async fn js_click(page: &Page, selector: &str) -> ScrapeResult<()> {
    page.evaluate(format!("document.querySelector('{selector}')?.click()"))
        .await?;
    Ok(())
}

pub async fn scroll_by(page: &Page, pixels: i64) -> ScrapeResult<()> {
    page.evaluate(format!("window.scrollBy(0, {pixels})")).await?;
    Ok(())
}
