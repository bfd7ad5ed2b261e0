//! Tool system and the interaction state machine.
//!
//! [`ToolMachine`] holds the active tool and a single [`Interaction`]
//! describing the gesture in progress, so at most one gesture exists at a
//! time. Event handlers receive a [`ToolContext`] that borrows every
//! collaborator they may touch.

mod draw;
pub mod handles;
pub mod manipulate;
mod select;

pub use handles::{Corner, End, Handle, HandleKind, TextEdge, handles_for, hit_test_handles};
pub use select::hover_hint;

use crate::config::EditorConfig;
use crate::filter::FilterCriteria;
use crate::history::History;
use crate::input::{KeyAction, Modifiers, MouseButton};
use crate::selection::Selection;
use crate::shapes::{Shape, ShapeId, ShapeKind, ShapeStyle};
use crate::store::ShapeStore;
use crate::symbols::SymbolLibrary;
use crate::view::ViewTransform;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ToolKind {
    #[default]
    Select,
    /// Filled zone rectangle (`rect` kind).
    ZoneRect,
    /// Markup rectangle (`draw-rect` kind).
    DrawRect,
    DrawEllipse,
    DrawLine,
    DrawArrow,
    DrawPolygon,
    DrawCloud,
    DrawPolyline,
    MeasureLength,
    MeasureArea,
    Calibrate,
    PlaceText,
    PlaceSymbol,
}

impl ToolKind {
    /// Press-drag-release tools.
    pub fn is_drag_tool(self) -> bool {
        matches!(
            self,
            ToolKind::ZoneRect
                | ToolKind::DrawRect
                | ToolKind::DrawEllipse
                | ToolKind::DrawLine
                | ToolKind::DrawArrow
                | ToolKind::MeasureLength
                | ToolKind::Calibrate
        )
    }

    /// Click-per-vertex tools.
    pub fn is_vertex_tool(self) -> bool {
        matches!(
            self,
            ToolKind::DrawPolygon | ToolKind::DrawCloud | ToolKind::DrawPolyline | ToolKind::MeasureArea
        )
    }

    /// Minimum vertex count to commit a vertex tool's shape.
    fn min_vertices(self) -> usize {
        if self == ToolKind::DrawPolyline { 2 } else { 3 }
    }

    /// Build the shape this tool creates from two points.
    fn shape_from_points(self, a: Point, b: Point) -> Option<Shape> {
        let rect = Rect::from_points(a, b);
        Some(match self {
            ToolKind::ZoneRect => Shape::rectangle(rect),
            ToolKind::DrawRect => Shape::draw_rect(rect),
            ToolKind::DrawEllipse => Shape::ellipse(rect),
            ToolKind::DrawLine => Shape::line(a, b),
            ToolKind::DrawArrow => Shape::arrow(a, b),
            ToolKind::MeasureLength => Shape::measure_length(a, b),
            ToolKind::Calibrate => Shape::calibration_line(a, b),
            _ => return None,
        })
    }

    /// Build the shape this tool creates from a vertex list.
    fn shape_from_vertices(self, points: Vec<Point>) -> Option<Shape> {
        Some(match self {
            ToolKind::DrawPolygon => Shape::polygon(points),
            ToolKind::DrawCloud => Shape::cloud(points),
            ToolKind::MeasureArea => Shape::measure_area(points),
            ToolKind::DrawPolyline => Shape::polyline(points),
            _ => return None,
        })
    }

    /// Kind of shape produced, if any.
    pub fn shape_kind(self) -> Option<ShapeKind> {
        Some(match self {
            ToolKind::ZoneRect => ShapeKind::Rect,
            ToolKind::DrawRect => ShapeKind::DrawRect,
            ToolKind::DrawEllipse => ShapeKind::Ellipse,
            ToolKind::DrawLine => ShapeKind::Line,
            ToolKind::DrawArrow => ShapeKind::Arrow,
            ToolKind::DrawPolygon => ShapeKind::Polygon,
            ToolKind::DrawCloud => ShapeKind::Cloud,
            ToolKind::DrawPolyline => ShapeKind::DrawPoly,
            ToolKind::MeasureLength => ShapeKind::MeasureLength,
            ToolKind::MeasureArea => ShapeKind::MeasureArea,
            ToolKind::Calibrate => ShapeKind::CalibrationLine,
            ToolKind::PlaceText => ShapeKind::Text,
            ToolKind::PlaceSymbol => ShapeKind::Symbol,
            ToolKind::Select => return None,
        })
    }
}

/// A polyline being extended from one of its ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extension {
    pub shape_id: ShapeId,
    /// When `Start`, the buffered points are reversed while drawing.
    pub end: End,
}

/// Symbol placement phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementPhase {
    /// Dropped, not yet sized.
    Anchored,
    /// Following the pointer.
    Growing,
}

/// The gesture in progress. Points are in model coordinates unless noted.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Interaction {
    #[default]
    Idle,
    /// Press-drag shape or calibration line.
    Drawing { anchor: Point, current: Point },
    /// Multi-point buffer with the pointer position as a rubber-band vertex.
    Vertices {
        points: Vec<Point>,
        hover: Option<Point>,
        extending: Option<Extension>,
    },
    PlacingSymbol {
        symbol_id: String,
        anchor: Point,
        current: Point,
        phase: PlacementPhase,
    },
    /// Moving the selection. `saved` records whether the history entry for
    /// this gesture exists yet.
    Dragging {
        originals: Vec<Shape>,
        start: Point,
        saved: bool,
    },
    Resizing {
        original: Shape,
        handle: HandleKind,
        start: Point,
        saved: bool,
    },
    Rotating {
        original: Shape,
        center: Point,
        saved: bool,
    },
    /// `last` is in screen coordinates.
    Panning { last: Point, moved: bool },
}

/// Everything an event handler may read or mutate.
pub struct ToolContext<'a> {
    pub store: &'a mut ShapeStore,
    pub history: &'a mut History,
    pub view: &'a mut ViewTransform,
    pub selection: &'a mut Selection,
    pub filter: &'a FilterCriteria,
    pub config: &'a EditorConfig,
    pub symbols: &'a SymbolLibrary,
}

impl ToolContext<'_> {
    /// Screen-pixel length in model units at the current scale.
    fn model_dist(&self, pixels: f64) -> f64 {
        self.view.screen_to_model_dist(pixels)
    }
}

/// What an event produced, for the host to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    None,
    /// A new shape was committed (or an existing one extended).
    Committed(ShapeId),
    /// Geometry of existing shapes changed through a gesture.
    Modified(Vec<ShapeId>),
    Removed(Vec<ShapeId>),
    /// Clipboard shapes were inserted with fresh ids.
    Pasted(Vec<ShapeId>),
    /// A calibration line was drawn; the host should ask for its real
    /// length and call `Editor::complete_calibration`.
    CalibrationRequested { pixels: f64 },
    /// A text box was placed; the host may open its content editor.
    TextPlaced(ShapeId),
    /// Pan or zoom changed the view.
    ViewChanged,
}

/// Cursor the host should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorHint {
    Default,
    Crosshair,
    Pointer,
    Move,
    Grab,
    Grabbing,
    Resize,
    Rotate,
}

/// Active tool, current gesture and the style applied to new shapes.
#[derive(Debug, Clone, Default)]
pub struct ToolMachine {
    tool: ToolKind,
    interaction: Interaction,
    /// Style applied to newly drawn shapes.
    pub style: ShapeStyle,
    pending_calibration: Option<(Point, Point)>,
}

impl ToolMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    /// Switch tools. Any in-progress buffer is discarded.
    pub fn set_tool(&mut self, tool: ToolKind) {
        self.tool = tool;
        self.interaction = Interaction::Idle;
        self.pending_calibration = None;
    }

    /// Drop the current gesture and any pending calibration line without
    /// committing. The tool stays selected.
    pub fn cancel(&mut self) {
        self.interaction = Interaction::Idle;
        self.pending_calibration = None;
    }

    /// Calibration line waiting for its real length.
    pub fn pending_calibration(&self) -> Option<(Point, Point)> {
        self.pending_calibration
    }

    pub(crate) fn take_pending_calibration(&mut self) -> Option<(Point, Point)> {
        self.pending_calibration.take()
    }

    /// Start placing a symbol dropped at `model`.
    pub fn begin_symbol_placement(&mut self, symbol_id: impl Into<String>, model: Point) {
        self.tool = ToolKind::PlaceSymbol;
        self.interaction = Interaction::PlacingSymbol {
            symbol_id: symbol_id.into(),
            anchor: model,
            current: model,
            phase: PlacementPhase::Anchored,
        };
    }

    pub fn pointer_down(
        &mut self,
        ctx: &mut ToolContext,
        screen: Point,
        button: MouseButton,
        modifiers: Modifiers,
    ) -> ToolOutcome {
        match button {
            MouseButton::Left => {}
            MouseButton::Middle if self.interaction == Interaction::Idle => {
                self.interaction = Interaction::Panning {
                    last: screen,
                    moved: false,
                };
                return ToolOutcome::None;
            }
            _ => return ToolOutcome::None,
        }
        let model = ctx.view.to_model(screen);
        if self.tool == ToolKind::Select {
            self.select_down(ctx, model, screen, modifiers)
        } else {
            self.draw_down(ctx, model)
        }
    }

    pub fn pointer_move(&mut self, ctx: &mut ToolContext, screen: Point) -> ToolOutcome {
        let model = ctx.view.to_model(screen);
        match &mut self.interaction {
            Interaction::Idle => ToolOutcome::None,
            Interaction::Drawing { current, .. } => {
                *current = model;
                ToolOutcome::None
            }
            Interaction::Vertices { hover, .. } => {
                *hover = Some(model);
                ToolOutcome::None
            }
            Interaction::PlacingSymbol { current, phase, .. } => {
                *current = model;
                *phase = PlacementPhase::Growing;
                ToolOutcome::None
            }
            Interaction::Panning { last, moved } => {
                let delta = screen - *last;
                ctx.view.pan_by(delta);
                *last = screen;
                *moved = true;
                ToolOutcome::None
            }
            Interaction::Dragging { .. } | Interaction::Resizing { .. } | Interaction::Rotating { .. } => {
                self.manipulate_move(ctx, model)
            }
        }
    }

    pub fn pointer_up(&mut self, ctx: &mut ToolContext, screen: Point) -> ToolOutcome {
        let model = ctx.view.to_model(screen);
        match &self.interaction {
            Interaction::Drawing { .. } => self.draw_up(ctx, model),
            Interaction::Panning { moved, .. } => {
                let moved = *moved;
                self.interaction = Interaction::Idle;
                if moved { ToolOutcome::ViewChanged } else { ToolOutcome::None }
            }
            Interaction::Dragging { .. } | Interaction::Resizing { .. } | Interaction::Rotating { .. } => {
                self.manipulate_up(ctx)
            }
            // Vertex buffers and symbol placement continue across releases.
            Interaction::Vertices { .. } | Interaction::PlacingSymbol { .. } | Interaction::Idle => ToolOutcome::None,
        }
    }

    /// Handle `Escape` and `Finish`; other keys are editor-level commands.
    pub fn key(&mut self, ctx: &mut ToolContext, action: KeyAction) -> ToolOutcome {
        match action {
            KeyAction::Escape => {
                match &self.interaction {
                    Interaction::Vertices { .. } | Interaction::Drawing { .. } | Interaction::PlacingSymbol { .. } => {
                        log::debug!("Discarded in-progress {:?} gesture", self.tool);
                        self.interaction = Interaction::Idle;
                        if matches!(self.tool, ToolKind::PlaceSymbol) {
                            self.tool = ToolKind::Select;
                        }
                    }
                    Interaction::Idle => {
                        self.pending_calibration = None;
                        if self.tool == ToolKind::Select {
                            ctx.selection.clear();
                        } else {
                            self.tool = ToolKind::Select;
                        }
                    }
                    _ => {}
                }
                ToolOutcome::None
            }
            KeyAction::Finish if matches!(self.interaction, Interaction::Vertices { .. }) => self.finish_vertices(ctx),
            _ => ToolOutcome::None,
        }
    }

    /// Shape describing the gesture in progress, for rendering.
    pub fn preview(&self, symbols: &SymbolLibrary) -> Option<Shape> {
        let shape = match &self.interaction {
            Interaction::Drawing { anchor, current } => self.tool.shape_from_points(*anchor, *current)?,
            Interaction::Vertices {
                points,
                hover,
                extending,
            } => {
                let mut points = points.clone();
                points.extend(*hover);
                if extending.is_some() {
                    Shape::polyline(points)
                } else {
                    self.tool.shape_from_vertices(points)?
                }
            }
            Interaction::PlacingSymbol {
                symbol_id,
                anchor,
                current,
                ..
            } => {
                let aspect = symbols.get(symbol_id).map_or(1.0, |s| s.aspect());
                Shape::symbol(draw::symbol_rect(*anchor, *current, aspect, 0.0), symbol_id.clone())
            }
            _ => {
                let (a, b) = self.pending_calibration?;
                Shape::calibration_line(a, b)
            }
        };
        Some(shape.with_style(self.style.clone()))
    }
}
