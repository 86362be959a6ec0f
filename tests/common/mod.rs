//! Shared fixtures for integration tests.

#![allow(dead_code)]

use layerforge::core::types::{ComponentType, LayerId};
use layerforge::registry::{Registry, RegistryEntry, RenderCapability};
use layerforge::schema::{ObjectShape, Shape};
use layerforge::session::{Session, SessionSettings};

pub fn button_shape() -> ObjectShape {
    let variant = Shape::union(
        ["default", "destructive", "outline", "secondary", "ghost", "link"]
            .map(|v| Shape::literal(v)),
    );
    let size = Shape::union(["default", "sm", "lg", "icon"].map(|v| Shape::literal(v)));
    ObjectShape::new()
        .field("asChild", Shape::optional(Shape::Boolean))
        .field("children", Shape::optional(Shape::Any))
        .field("variant", Shape::nullable(Shape::optional(variant)))
        .field("size", Shape::nullable(Shape::optional(size)))
}

pub fn badge_shape() -> ObjectShape {
    ObjectShape::new()
        .field("children", Shape::optional(Shape::Any))
        .field(
            "variant",
            Shape::enumeration_with_default(
                ["default", "secondary", "destructive", "outline"],
                "default",
            ),
        )
}

pub fn transactions_shape() -> ObjectShape {
    let row = ObjectShape::new()
        .field("id", Shape::String)
        .field("customer", Shape::String)
        .field("email", Shape::String)
        .field("amount", Shape::Number);
    ObjectShape::new().field("data", Shape::array(Shape::Object(row)))
}

/// A component with a required field nothing can synthesize. `series`
/// alone would derive as an empty list.
pub fn chart_shape() -> ObjectShape {
    let formatter = || ObjectShape::new().field("formatter", Shape::Any);
    ObjectShape::new()
        .field("title", Shape::String)
        .field("series", Shape::array(Shape::Object(formatter())))
        .field("legend", Shape::Object(formatter()))
}

/// A component whose only list holds elements nothing can synthesize.
pub fn feed_shape() -> ObjectShape {
    ObjectShape::new().field("items", Shape::array(Shape::Any))
}

fn entry(name: &str, shape: &ObjectShape) -> RegistryEntry {
    RegistryEntry::new(
        ComponentType::new(name).unwrap(),
        RenderCapability::new(format!("@/components/ui/{}", name.to_lowercase())),
        shape,
    )
}

pub fn registry() -> Registry {
    Registry::new()
        .with(entry("Button", &button_shape()))
        .unwrap()
        .with(entry("Badge", &badge_shape()))
        .unwrap()
        .with(entry("Transactions", &transactions_shape()))
        .unwrap()
        .with(entry("Chart", &chart_shape()))
        .unwrap()
        .with(entry("Feed", &feed_shape()))
        .unwrap()
}

pub fn session() -> Session {
    Session::with_settings(
        registry(),
        SessionSettings {
            id_seed: Some(42),
            ..Default::default()
        },
    )
}

pub fn strict_session() -> Session {
    Session::with_settings(
        registry(),
        SessionSettings {
            id_seed: Some(42),
            strict: true,
            ..Default::default()
        },
    )
}

pub fn id(s: &str) -> LayerId {
    LayerId::new(s).unwrap()
}

pub fn child_ids(session: &Session, parent: &LayerId) -> Vec<LayerId> {
    session
        .find_layer_by_id(parent)
        .unwrap()
        .children()
        .iter()
        .map(|c| c.id().clone())
        .collect()
}
