//! Drawing tools: drag shapes, vertex shapes, text and symbol placement.

use super::{End, Extension, Interaction, ToolContext, ToolKind, ToolMachine, ToolOutcome};
use crate::shapes::{Geometry, Shape, ShapeId};
use kurbo::{Point, Rect, Vec2};

/// Buffered vertices needed before a press on the first vertex finishes.
const CLOSE_MIN_VERTICES: usize = 3;

impl ToolMachine {
    pub(super) fn draw_down(&mut self, ctx: &mut ToolContext, model: Point) -> ToolOutcome {
        match self.tool {
            tool if tool.is_drag_tool() => {
                self.pending_calibration = None;
                self.interaction = Interaction::Drawing {
                    anchor: model,
                    current: model,
                };
                ToolOutcome::None
            }
            tool if tool.is_vertex_tool() => self.vertex_down(ctx, model),
            ToolKind::PlaceText => self.place_text(ctx, model),
            ToolKind::PlaceSymbol => self.place_symbol(ctx, model),
            _ => ToolOutcome::None,
        }
    }

    pub(super) fn draw_up(&mut self, ctx: &mut ToolContext, model: Point) -> ToolOutcome {
        let Interaction::Drawing { anchor, .. } = std::mem::take(&mut self.interaction) else {
            return ToolOutcome::None;
        };
        let min = ctx.model_dist(ctx.config.min_draw_size);
        let rect = Rect::from_points(anchor, model);
        let length = (model - anchor).hypot();
        let too_small = match self.tool {
            ToolKind::ZoneRect | ToolKind::DrawRect | ToolKind::DrawEllipse => rect.width() < min || rect.height() < min,
            _ => length < min,
        };
        if too_small {
            log::debug!("Discarded {:?} gesture below minimum size", self.tool);
            return ToolOutcome::None;
        }

        if self.tool == ToolKind::Calibrate {
            // The line stays pending until the host supplies its real length.
            self.pending_calibration = Some((anchor, model));
            return ToolOutcome::CalibrationRequested { pixels: length };
        }

        match self.tool.shape_from_points(anchor, model) {
            Some(shape) => ToolOutcome::Committed(self.commit(ctx, shape)),
            None => ToolOutcome::None,
        }
    }

    fn vertex_down(&mut self, ctx: &mut ToolContext, model: Point) -> ToolOutcome {
        let close_radius = ctx.model_dist(ctx.config.close_radius);

        let Interaction::Vertices { points, hover, .. } = &mut self.interaction else {
            self.interaction = Interaction::Vertices {
                points: vec![model],
                hover: None,
                extending: None,
            };
            return ToolOutcome::None;
        };

        // Any vertex tool finishes on a press near the first vertex once three
        // are buffered. Polylines otherwise end only on `Finish`.
        let finishing = points.len() >= CLOSE_MIN_VERTICES
            && points.first().is_some_and(|p| (*p - model).hypot() <= close_radius);
        if finishing {
            return self.finish_vertices(ctx);
        }
        points.push(model);
        *hover = Some(model);
        ToolOutcome::None
    }

    /// Commit the vertex buffer. Too few vertices discards it silently.
    pub(super) fn finish_vertices(&mut self, ctx: &mut ToolContext) -> ToolOutcome {
        let Interaction::Vertices {
            mut points, extending, ..
        } = std::mem::take(&mut self.interaction)
        else {
            return ToolOutcome::None;
        };

        if let Some(extension) = extending {
            if extension.end == End::Start {
                points.reverse();
            }
            return self.commit_extension(ctx, extension.shape_id, points);
        }

        if points.len() < self.tool.min_vertices() {
            log::debug!("Discarded {:?} with {} vertices", self.tool, points.len());
            return ToolOutcome::None;
        }
        match self.tool.shape_from_vertices(points) {
            Some(shape) => ToolOutcome::Committed(self.commit(ctx, shape)),
            None => ToolOutcome::None,
        }
    }

    /// Re-enter polyline drawing from one end of an existing polyline.
    pub(super) fn begin_extension(&mut self, shape: &Shape, end: End) {
        let Some(points) = shape.points() else {
            return;
        };
        let mut points = points.to_vec();
        if end == End::Start {
            points.reverse();
        }
        self.tool = ToolKind::DrawPolyline;
        self.interaction = Interaction::Vertices {
            points,
            hover: None,
            extending: Some(Extension {
                shape_id: shape.id(),
                end,
            }),
        };
    }

    fn commit_extension(&mut self, ctx: &mut ToolContext, id: ShapeId, points: Vec<Point>) -> ToolOutcome {
        let unchanged = ctx.store.get(id).and_then(Shape::points).is_some_and(|p| p == points.as_slice());
        self.tool = ToolKind::Select;
        if unchanged {
            return ToolOutcome::None;
        }
        ctx.history.save(ctx.store);
        let result = ctx.store.modify(id, true, |shape| {
            if let Geometry::Path(path) = &mut shape.geometry {
                path.set_points(points);
            }
        });
        match result {
            Ok(()) => {
                ctx.selection.select(id);
                log::debug!("Extended polyline {id}");
                ToolOutcome::Committed(id)
            }
            Err(err) => {
                log::warn!("Extension discarded: {err}");
                ToolOutcome::None
            }
        }
    }

    fn place_text(&mut self, ctx: &mut ToolContext, model: Point) -> ToolOutcome {
        let (w, h) = ctx.config.text_default_size;
        let size = Vec2::new(ctx.model_dist(w), ctx.model_dist(h));
        let font_size = ctx.model_dist(ctx.config.text_font_size);
        let shape = Shape::text(Rect::from_origin_size(model, size.to_size()), "", font_size);
        let id = self.commit(ctx, shape);
        ToolOutcome::TextPlaced(id)
    }

    fn place_symbol(&mut self, ctx: &mut ToolContext, model: Point) -> ToolOutcome {
        let Interaction::PlacingSymbol {
            symbol_id, anchor, ..
        } = std::mem::take(&mut self.interaction)
        else {
            // Symbol tool without a dropped symbol does nothing.
            return ToolOutcome::None;
        };
        let aspect = match ctx.symbols.get(&symbol_id) {
            Some(symbol) => symbol.aspect(),
            None => {
                log::warn!("Placing unknown symbol {symbol_id}");
                1.0
            }
        };
        let min = ctx.model_dist(ctx.config.min_symbol_size);
        let rect = symbol_rect(anchor, model, aspect, min);
        ToolOutcome::Committed(self.commit(ctx, Shape::symbol(rect, symbol_id)))
    }

    /// Add a new shape with history, select it and return to `select`.
    fn commit(&mut self, ctx: &mut ToolContext, shape: Shape) -> ShapeId {
        let shape = shape.with_style(self.style.clone());
        ctx.history.save(ctx.store);
        let id = ctx.store.add(shape);
        ctx.selection.select(id);
        log::debug!("Committed {:?} shape {id}", self.tool);
        self.tool = ToolKind::Select;
        self.interaction = Interaction::Idle;
        id
    }
}

/// Symbol box grown from `anchor` toward `pointer`, keeping `aspect`
/// (width / height). The longer side is at least `min_size`.
pub(super) fn symbol_rect(anchor: Point, pointer: Point, aspect: f64, min_size: f64) -> Rect {
    let delta = pointer - anchor;
    let mut width = delta.x.abs().max(delta.y.abs() * aspect);
    let mut height = width / aspect;
    let longest = width.max(height);
    if longest < min_size {
        let grow = if longest > f64::EPSILON { min_size / longest } else { 0.0 };
        if grow > 0.0 {
            width *= grow;
            height *= grow;
        } else if aspect >= 1.0 {
            width = min_size;
            height = min_size / aspect;
        } else {
            height = min_size;
            width = min_size * aspect;
        }
    }
    let x0 = if delta.x < 0.0 { anchor.x - width } else { anchor.x };
    let y0 = if delta.y < 0.0 { anchor.y - height } else { anchor.y };
    Rect::new(x0, y0, x0 + width, y0 + height)
}
