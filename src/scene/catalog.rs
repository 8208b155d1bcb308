//! The common KML kinds, registered by composition from their abstract bases.

use crate::error::RegistryError;

use super::{ChildDescriptor, Constraint, FieldDescriptor, KindSpec, Registry};

pub const ALTITUDE_MODES: &[&str] = &[
    "clampToGround",
    "relativeToGround",
    "absolute",
    "clampToSeaFloor",
    "relativeToSeaFloor",
];

pub const COLOR_MODES: &[&str] = &["normal", "random"];

pub const FLY_TO_MODES: &[&str] = &["bounce", "smooth"];

fn field(name: &'static str, tag: &'static str) -> FieldDescriptor {
    FieldDescriptor::new(name, tag)
}

fn altitude_mode() -> FieldDescriptor {
    field("altitude_mode", "gx:altitudeMode").symbol(ALTITUDE_MODES)
}

impl Registry {
    /// Builds the registry of common KML kinds.
    pub fn kml() -> Result<Registry, RegistryError> {
        Registry::builder()
            .kind(KindSpec::new("Object").abstract_kind())
            .kind(
                KindSpec::new("Feature")
                    .extends("Object")
                    .abstract_kind()
                    .field(field("name", "name"))
                    .field(field("visibility", "visibility"))
                    .field(field("is_open", "open"))
                    .field(field("author_name", "atom:author").nested(&["atom:name"]))
                    .field(field("address", "address"))
                    .field(field("phone_number", "phoneNumber"))
                    .field(field("snippet", "Snippet"))
                    .field(field("description", "description"))
                    .field(field("style_url", "styleUrl"))
                    .slot(ChildDescriptor::single("abstract_view", "AbstractView"))
                    .slot(ChildDescriptor::single("time_primitive", "TimePrimitive"))
                    .slot(ChildDescriptor::many("styles", "StyleSelector")),
            )
            .kind(
                KindSpec::new("Container")
                    .extends("Feature")
                    .abstract_kind()
                    .slot(ChildDescriptor::many("features", "Feature")),
            )
            .kind(KindSpec::new("Document").extends("Container"))
            .kind(KindSpec::new("Folder").extends("Container"))
            .kind(
                KindSpec::new("Placemark")
                    .extends("Feature")
                    .slot(ChildDescriptor::single("geometry", "Geometry")),
            )
            // Geometry
            .kind(KindSpec::new("Geometry").extends("Object").abstract_kind())
            .kind(
                KindSpec::new("Point")
                    .extends("Geometry")
                    .field(field("extrude", "extrude"))
                    .field(altitude_mode())
                    .field(field("coordinates", "coordinates")),
            )
            .kind(
                KindSpec::new("LineString")
                    .extends("Geometry")
                    .field(field("extrude", "extrude"))
                    .field(field("tessellate", "tessellate"))
                    .field(altitude_mode())
                    .field(field("coordinates", "coordinates")),
            )
            .kind(
                KindSpec::new("LinearRing")
                    .extends("Geometry")
                    .field(field("extrude", "extrude"))
                    .field(field("tessellate", "tessellate"))
                    .field(altitude_mode())
                    .field(field("coordinates", "coordinates")),
            )
            .kind(
                KindSpec::new("Polygon")
                    .extends("Geometry")
                    .field(field("extrude", "extrude"))
                    .field(field("tessellate", "tessellate"))
                    .field(altitude_mode())
                    .slot(
                        ChildDescriptor::single("outer_boundary", "LinearRing")
                            .wrapped("outerBoundaryIs"),
                    )
                    .slot(
                        ChildDescriptor::many("inner_boundaries", "LinearRing")
                            .wrapped("innerBoundaryIs"),
                    ),
            )
            .kind(
                KindSpec::new("MultiGeometry")
                    .extends("Geometry")
                    .slot(ChildDescriptor::many("geometries", "Geometry")),
            )
            // Styles
            .kind(KindSpec::new("StyleSelector").extends("Object").abstract_kind())
            .kind(
                KindSpec::new("Style")
                    .extends("StyleSelector")
                    .slot(ChildDescriptor::single("icon_style", "IconStyle"))
                    .slot(ChildDescriptor::single("label_style", "LabelStyle"))
                    .slot(ChildDescriptor::single("line_style", "LineStyle"))
                    .slot(ChildDescriptor::single("poly_style", "PolyStyle")),
            )
            .kind(KindSpec::new("SubStyle").extends("Object").abstract_kind())
            .kind(
                KindSpec::new("ColorStyle")
                    .extends("SubStyle")
                    .abstract_kind()
                    .field(field("color", "color"))
                    .field(field("color_mode", "colorMode").symbol(COLOR_MODES)),
            )
            .kind(
                KindSpec::new("IconStyle")
                    .extends("ColorStyle")
                    .field(field("scale", "scale").constrained(Constraint::NonNegative))
                    .field(field("heading", "heading").constrained(Constraint::Angle360))
                    .field(field("hot_spot", "hotSpot"))
                    .slot(ChildDescriptor::single("icon", "Icon")),
            )
            .kind(
                KindSpec::new("LabelStyle")
                    .extends("ColorStyle")
                    .field(field("scale", "scale").constrained(Constraint::NonNegative)),
            )
            .kind(
                KindSpec::new("LineStyle")
                    .extends("ColorStyle")
                    .field(field("width", "width").constrained(Constraint::NonNegative)),
            )
            .kind(
                KindSpec::new("PolyStyle")
                    .extends("ColorStyle")
                    .field(field("fill", "fill"))
                    .field(field("outline", "outline")),
            )
            .kind(
                KindSpec::new("Icon")
                    .extends("Object")
                    .suppress_id()
                    .field(field("href", "href")),
            )
            // Views
            .kind(KindSpec::new("AbstractView").extends("Object").abstract_kind())
            .kind(
                KindSpec::new("Camera")
                    .extends("AbstractView")
                    .field(field("longitude", "longitude").constrained(Constraint::Angle180))
                    .field(field("latitude", "latitude").constrained(Constraint::Angle90))
                    .field(field("altitude", "altitude"))
                    .field(field("heading", "heading").constrained(Constraint::Angle360))
                    .field(field("tilt", "tilt").constrained(Constraint::AnglePos180))
                    .field(field("roll", "roll").constrained(Constraint::Angle180))
                    .field(altitude_mode()),
            )
            .kind(
                KindSpec::new("LookAt")
                    .extends("AbstractView")
                    .field(field("longitude", "longitude").constrained(Constraint::Angle180))
                    .field(field("latitude", "latitude").constrained(Constraint::Angle90))
                    .field(field("altitude", "altitude"))
                    .field(field("heading", "heading").constrained(Constraint::Angle360))
                    .field(field("tilt", "tilt").constrained(Constraint::AnglePos90))
                    .field(field("range", "range").constrained(Constraint::NonNegative))
                    .field(altitude_mode()),
            )
            // Time
            .kind(KindSpec::new("TimePrimitive").extends("Object").abstract_kind())
            .kind(
                KindSpec::new("TimeStamp")
                    .extends("TimePrimitive")
                    .field(field("when", "when")),
            )
            .kind(
                KindSpec::new("TimeSpan")
                    .extends("TimePrimitive")
                    .field(field("begin", "begin"))
                    .field(field("end", "end")),
            )
            // Tours
            .kind(
                KindSpec::new("Tour")
                    .extends("Feature")
                    .tag("gx:Tour")
                    .slot(ChildDescriptor::single("playlist", "Playlist")),
            )
            .kind(
                KindSpec::new("Playlist")
                    .extends("Object")
                    .tag("gx:Playlist")
                    .slot(ChildDescriptor::many("steps", "TourPrimitive").structural()),
            )
            .kind(KindSpec::new("TourPrimitive").extends("Object").abstract_kind())
            .kind(
                KindSpec::new("FlyTo")
                    .extends("TourPrimitive")
                    .tag("gx:FlyTo")
                    .field(
                        field("duration", "gx:duration")
                            .constrained(Constraint::NonNegative)
                            .fixed(),
                    )
                    .field(field("fly_to_mode", "gx:flyToMode").symbol(FLY_TO_MODES).fixed())
                    .slot(ChildDescriptor::single("view", "AbstractView")),
            )
            .kind(
                KindSpec::new("Wait")
                    .extends("TourPrimitive")
                    .tag("gx:Wait")
                    .field(
                        field("duration", "gx:duration")
                            .constrained(Constraint::NonNegative)
                            .fixed(),
                    ),
            )
            .build()
    }
}
