use crate::model::{GraphicLayerDto, GraphicLayerItemDto, Millis};
use crate::{check_insert, TimelineError};

pub const DEFAULT_GRAPHIC_ITEM_DURATION_MS: Millis = 5_000;

/// Layers a project starts with when the backend sends none.
pub fn default_graphics() -> Vec<GraphicLayerDto> {
    vec![
        GraphicLayerDto { id: Some("logo".into()), items: Vec::new() },
        GraphicLayerDto { id: Some("overlay".into()), items: Vec::new() },
    ]
}

pub fn add_layer(layers: &[GraphicLayerDto], at: usize) -> Result<Vec<GraphicLayerDto>, TimelineError> {
    check_insert(at, layers.len())?;
    let mut out = layers.to_vec();
    out.insert(at, GraphicLayerDto::default());
    Ok(out)
}

/// Insert an empty item at `at`, starting where the previous item ends.
pub fn add_layer_item(
    items: &[GraphicLayerItemDto],
    at: usize,
) -> Result<Vec<GraphicLayerItemDto>, TimelineError> {
    check_insert(at, items.len())?;
    let start_time = at
        .checked_sub(1)
        .and_then(|prev| items.get(prev))
        .map(|p| p.start_time + p.duration)
        .unwrap_or(0);
    let mut out = items.to_vec();
    out.insert(
        at,
        GraphicLayerItemDto { start_time, duration: DEFAULT_GRAPHIC_ITEM_DURATION_MS, ..Default::default() },
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_item_follows_previous() {
        let items = vec![GraphicLayerItemDto { name: "a".into(), start_time: 1000, duration: 2000, ..Default::default() }];
        let out = add_layer_item(&items, 1).unwrap();
        assert_eq!(out[1].start_time, 3000);
        assert_eq!(out[1].duration, DEFAULT_GRAPHIC_ITEM_DURATION_MS);
        assert_eq!(add_layer_item(&items, 0).unwrap()[0].start_time, 0);
        assert!(add_layer_item(&items, 2).is_err());
    }

    #[test]
    fn new_layer_has_no_id() {
        let out = add_layer(&default_graphics(), 0).unwrap();
        assert_eq!(out.len(), 3);
        assert!(out[0].id.is_none());
    }
}
