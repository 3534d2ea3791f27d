pub mod manipulator;
pub mod pointer;
pub mod ray;

use nalgebra_glm as glm;

use crate::pose::PoseResolver;
use manipulator::{DragGrab, Handle, Manipulator};
use pointer::{NormalizedPointer, PointerButton, PointerEvent};
use ray::Ray;

/// Pointer travel (normalized units) that turns a press on a joint into a drag.
const DRAG_THRESHOLD: f32 = 0.01;

/// What `InteractionController::dispatch` needs to know about the scene.
pub struct InteractionContext<'a> {
    pub inverse_proj_view: glm::Mat4,
    /// Camera forward direction.
    pub view_dir: glm::Vec3,
    /// Marker positions as currently drawn.
    pub markers: &'a [glm::Vec3],
    /// Uncalibrated render-space positions at the current frame.
    pub bases: &'a [glm::Vec3],
    pub pick_radius: f32,
    pub resolver: &'a PoseResolver,
    pub manipulator: &'a mut Manipulator,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub sensor: usize,
    pub grab: DragGrab,
    pub position: glm::Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControllerState {
    Idle,
    /// Pressed on a joint, not moved far enough to drag yet.
    Selecting { sensor: usize, press: NormalizedPointer },
    Dragging(DragSession),
    Orbiting { last: NormalizedPointer },
    Panning { last: NormalizedPointer },
}

/// Effects for the viewer to apply, in order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interaction {
    Select(Option<usize>),
    DragStarted(usize),
    DragMoved { sensor: usize, position: glm::Vec3, offset: glm::Vec3 },
    DragEnded(usize),
    Orbit(f32, f32),
    Pan(f32, f32),
    Zoom(f32),
}

/// Single dispatch point for pointer input: selection, joint drag and camera moves.
#[derive(Debug, Clone)]
pub struct InteractionController {
    state: ControllerState,
    selected: Option<usize>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self { state: ControllerState::Idle, selected: None }
    }

    pub fn state(&self) -> &ControllerState { &self.state }
    pub fn selected(&self) -> Option<usize> { self.selected }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, ControllerState::Dragging(_))
    }

    pub fn dragged_sensor(&self) -> Option<usize> {
        match self.state {
            ControllerState::Dragging(session) => Some(session.sensor),
            _ => None,
        }
    }

    pub fn orbit_enabled(&self) -> bool {
        !matches!(self.state, ControllerState::Selecting { .. } | ControllerState::Dragging(_))
    }

    pub fn reset(&mut self, manipulator: &mut Manipulator) {
        self.state = ControllerState::Idle;
        self.selected = None;
        manipulator.detach();
    }

    /// Selection set by the host. Ignored while a drag is in progress.
    pub fn select(&mut self, sensor: Option<usize>, markers: &[glm::Vec3], manipulator: &mut Manipulator) -> bool {
        if self.is_dragging() {return false};
        let sensor = sensor.filter(|s| *s < markers.len());
        self.selected = sensor;
        match sensor {
            Some(s) => manipulator.attach(s, markers[s]),
            None => manipulator.detach(),
        }
        true
    }

    pub fn dispatch(&mut self, event: PointerEvent, ctx: &mut InteractionContext) -> Vec<Interaction> {
        use ControllerState as S;
        use PointerEvent as E;

        let mut effects = vec![];
        let state = std::mem::replace(&mut self.state, S::Idle);
        self.state = match (state, event) {
            (S::Idle, E::Down { pointer, button: PointerButton::Primary, .. }) => {
                self.press(pointer, ctx, &mut effects)
            }
            (S::Idle, E::Down { pointer, .. }) => S::Panning { last: pointer },
            (S::Idle, E::Wheel { delta }) => {
                effects.push(Interaction::Zoom(delta));
                S::Idle
            }

            (S::Selecting { sensor, press }, E::Move { pointer, .. }) => {
                let (dx, dy) = pointer.delta(&press);
                if dx.abs().max(dy.abs()) < DRAG_THRESHOLD {
                    S::Selecting { sensor, press }
                } else {
                    match self.begin_marker_drag(sensor, press, ctx) {
                        Some(session) => {
                            effects.push(Interaction::DragStarted(sensor));
                            S::Dragging(self.drag_to(session, pointer, ctx, &mut effects))
                        }
                        None => S::Selecting { sensor, press },
                    }
                }
            }
            (S::Selecting { .. }, E::Up { .. } | E::Cancel) => S::Idle,

            (S::Dragging(session), E::Move { pointer, .. }) => {
                S::Dragging(self.drag_to(session, pointer, ctx, &mut effects))
            }
            (S::Dragging(session), E::Up { .. } | E::Cancel) => {
                effects.push(Interaction::DragEnded(session.sensor));
                S::Idle
            }

            (S::Orbiting { last }, E::Move { pointer, .. }) => {
                let (dx, dy) = pointer.delta(&last);
                effects.push(Interaction::Orbit(dx, dy));
                S::Orbiting { last: pointer }
            }
            (S::Panning { last }, E::Move { pointer, .. }) => {
                let (dx, dy) = pointer.delta(&last);
                effects.push(Interaction::Pan(dx, dy));
                S::Panning { last: pointer }
            }
            (S::Orbiting { .. } | S::Panning { .. }, E::Up { .. } | E::Cancel) => S::Idle,
            (s @ (S::Orbiting { .. } | S::Panning { .. }), E::Wheel { delta }) => {
                effects.push(Interaction::Zoom(delta));
                s
            }

            (s, _) => s,
        };
        effects
    }

    fn press(&mut self, pointer: NormalizedPointer, ctx: &mut InteractionContext, effects: &mut Vec<Interaction>) -> ControllerState {
        let Some(ray) = Ray::from_ndc(pointer, &ctx.inverse_proj_view) else {return ControllerState::Idle};

        if let (Some(handle), Some(sensor)) = (ctx.manipulator.hit_test(&ray), ctx.manipulator.sensor()) {
            if let Some(grab) = ctx.manipulator.grab(&ray, handle, &ctx.view_dir) {
                effects.push(Interaction::DragStarted(sensor));
                return ControllerState::Dragging(DragSession { sensor, grab, position: grab.start });
            }
        }

        match pick_marker(&ray, ctx.markers, ctx.pick_radius) {
            Some(sensor) => {
                if self.selected != Some(sensor) {
                    self.selected = Some(sensor);
                    effects.push(Interaction::Select(Some(sensor)));
                }
                ctx.manipulator.attach(sensor, ctx.markers[sensor]);
                ControllerState::Selecting { sensor, press: pointer }
            }
            None => {
                if self.selected.take().is_some() {
                    effects.push(Interaction::Select(None));
                }
                ctx.manipulator.detach();
                ControllerState::Orbiting { last: pointer }
            }
        }
    }

    fn begin_marker_drag(&self, sensor: usize, press: NormalizedPointer, ctx: &InteractionContext) -> Option<DragSession> {
        let start = *ctx.markers.get(sensor)?;
        let ray = Ray::from_ndc(press, &ctx.inverse_proj_view)?;
        let grab = Manipulator::grab_at(start, &ray, Handle::Free, &ctx.view_dir)?;
        Some(DragSession { sensor, grab, position: start })
    }

    fn drag_to(
        &self,
        mut session: DragSession,
        pointer: NormalizedPointer,
        ctx: &mut InteractionContext,
        effects: &mut Vec<Interaction>,
    ) -> DragSession {
        let target = Ray::from_ndc(pointer, &ctx.inverse_proj_view)
            .and_then(|ray| session.grab.target(&ray));
        let (Some(position), Some(base)) = (target, ctx.bases.get(session.sensor)) else {return session};

        session.position = position;
        ctx.manipulator.set_position(position);
        effects.push(Interaction::DragMoved {
            sensor: session.sensor,
            position,
            offset: ctx.resolver.offset_for(&position, base),
        });
        session
    }
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new()
    }
}

/// Closest marker hit by the ray.
pub fn pick_marker(ray: &Ray, markers: &[glm::Vec3], radius: f32) -> Option<usize> {
    markers.iter()
        .enumerate()
        .filter_map(|(i, m)| ray.intersect_sphere(m, radius).map(|t| (i, t)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}


#[cfg(test)]
mod tests {
    use super::*;
    use pointer::PointerSource;
    use manipulator::Axis;

    struct Scene {
        proj_view: glm::Mat4,
        markers: Vec<glm::Vec3>,
        manipulator: Manipulator,
        resolver: PoseResolver,
    }

    impl Scene {
        fn new() -> Self {
            let proj = glm::perspective_rh_zo(1.0, 1.0, 0.1, 20.0);
            let view = glm::look_at(&glm::vec3(0.0, 0.0, 5.0), &glm::vec3(0.0, 0.0, 0.0), &glm::vec3(0.0, 1.0, 0.0));
            Self {
                proj_view: proj * view,
                markers: vec![glm::vec3(0.0, 0.0, 0.0), glm::vec3(1.5, 0.0, 0.0)],
                manipulator: Manipulator::new(0.5),
                resolver: PoseResolver::new(0.01),
            }
        }

        fn ndc(&self, world: glm::Vec3) -> NormalizedPointer {
            let p = self.proj_view * glm::vec4(world.x, world.y, world.z, 1.0);
            NormalizedPointer::new(p.x / p.w, p.y / p.w)
        }

        fn dispatch(&mut self, controller: &mut InteractionController, event: PointerEvent) -> Vec<Interaction> {
            let bases = self.markers.clone();
            let mut ctx = InteractionContext {
                inverse_proj_view: glm::inverse(&self.proj_view),
                view_dir: glm::vec3(0.0, 0.0, -1.0),
                markers: &self.markers,
                bases: &bases,
                pick_radius: 0.1,
                resolver: &self.resolver,
                manipulator: &mut self.manipulator,
            };
            controller.dispatch(event, &mut ctx)
        }
    }

    fn down(pointer: NormalizedPointer) -> PointerEvent {
        PointerEvent::Down { pointer, button: PointerButton::Primary, source: PointerSource::Mouse }
    }

    fn moved(pointer: NormalizedPointer) -> PointerEvent {
        PointerEvent::Move { pointer, source: PointerSource::Mouse }
    }

    fn up(pointer: NormalizedPointer) -> PointerEvent {
        PointerEvent::Up { pointer, button: PointerButton::Primary, source: PointerSource::Mouse }
    }

    #[test]
    fn press_on_joint_selects_it() {
        let mut scene = Scene::new();
        let mut controller = InteractionController::new();
        let at = scene.ndc(scene.markers[1]);

        assert_eq!(scene.dispatch(&mut controller, down(at)), vec![Interaction::Select(Some(1))]);
        assert!(matches!(controller.state(), ControllerState::Selecting { sensor: 1, .. }));
        assert!(!controller.orbit_enabled());
        assert_eq!(scene.manipulator.sensor(), Some(1));

        assert!(scene.dispatch(&mut controller, up(at)).is_empty());
        assert_eq!(controller.state(), &ControllerState::Idle);
        assert_eq!(controller.selected(), Some(1));
    }

    #[test]
    fn press_on_nothing_clears_selection_and_orbits() {
        let mut scene = Scene::new();
        let mut controller = InteractionController::new();
        let joint = scene.ndc(scene.markers[0]);
        scene.dispatch(&mut controller, down(joint));
        scene.dispatch(&mut controller, up(joint));

        let empty = NormalizedPointer::new(-0.8, 0.8);
        assert_eq!(scene.dispatch(&mut controller, down(empty)), vec![Interaction::Select(None)]);
        assert!(!scene.manipulator.is_visible());
        let effects = scene.dispatch(&mut controller, moved(NormalizedPointer::new(-0.7, 0.8)));
        assert_eq!(effects.len(), 1);
        assert!(matches!(effects[0], Interaction::Orbit(dx, dy) if (dx - 0.1).abs() < 1e-6 && dy == 0.0));
        assert!(scene.dispatch(&mut controller, up(empty)).is_empty());
    }

    #[test]
    fn dragging_a_joint_reports_offsets() {
        let mut scene = Scene::new();
        let mut controller = InteractionController::new();
        let start = scene.ndc(scene.markers[1]);
        scene.dispatch(&mut controller, down(start));

        let target = glm::vec3(1.5, 0.3, 0.0);
        let effects = scene.dispatch(&mut controller, moved(scene.ndc(target)));
        assert_eq!(effects[0], Interaction::DragStarted(1));
        let Interaction::DragMoved { sensor, position, offset } = effects[1] else { panic!("{effects:?}") };
        assert_eq!(sensor, 1);
        assert!(glm::distance(&position, &target) < 1e-4);
        assert!(glm::distance(&offset, &glm::vec3(0.0, 30.0, 0.0)) < 1e-2);
        assert!(controller.is_dragging());
        assert!(!controller.orbit_enabled());

        assert_eq!(scene.dispatch(&mut controller, up(start)), vec![Interaction::DragEnded(1)]);
        assert!(controller.orbit_enabled());
    }

    #[test]
    fn lumbar_axis_drag_offset() {
        let mut scene = Scene::new();
        let mut controller = InteractionController::new();
        let joint = scene.ndc(scene.markers[0]);
        scene.dispatch(&mut controller, down(joint));
        scene.dispatch(&mut controller, up(joint));

        let grab = scene.ndc(glm::vec3(0.3, 0.0, 0.0));
        assert_eq!(scene.dispatch(&mut controller, down(grab)), vec![Interaction::DragStarted(0)]);
        let Interaction::DragMoved { offset, position, .. } =
            scene.dispatch(&mut controller, moved(scene.ndc(glm::vec3(0.35, 0.02, 0.0))))[0]
            else { panic!() };

        assert!(glm::distance(&offset, &glm::vec3(5.0, 0.0, 0.0)) < 1e-2);
        assert_eq!(position.y, 0.0);
        assert_eq!(position.z, 0.0);
        assert_eq!(scene.manipulator.position(), position);
        assert!(matches!(controller.state(),
            ControllerState::Dragging(DragSession { grab, .. }) if grab.handle == Handle::Axis(Axis::X)));
    }

    #[test]
    fn wheel_zooms_except_while_dragging() {
        let mut scene = Scene::new();
        let mut controller = InteractionController::new();
        assert_eq!(scene.dispatch(&mut controller, PointerEvent::Wheel { delta: 1.0 }), vec![Interaction::Zoom(1.0)]);

        let start = scene.ndc(scene.markers[0]);
        scene.dispatch(&mut controller, down(start));
        scene.dispatch(&mut controller, moved(NormalizedPointer::new(start.x + 0.1, start.y)));
        assert!(controller.is_dragging());
        assert!(scene.dispatch(&mut controller, PointerEvent::Wheel { delta: 1.0 }).is_empty());
        assert_eq!(scene.dispatch(&mut controller, PointerEvent::Cancel), vec![Interaction::DragEnded(0)]);
    }

    #[test]
    fn secondary_button_pans() {
        let mut scene = Scene::new();
        let mut controller = InteractionController::new();
        let p = NormalizedPointer::new(0.0, 0.5);
        let press = PointerEvent::Down { pointer: p, button: PointerButton::Secondary, source: PointerSource::Touch };
        assert!(scene.dispatch(&mut controller, press).is_empty());
        let effects = scene.dispatch(&mut controller, moved(NormalizedPointer::new(0.0, 0.25)));
        assert_eq!(effects, vec![Interaction::Pan(0.0, -0.25)]);
    }

    #[test]
    fn host_selection_is_ignored_during_drag() {
        let mut scene = Scene::new();
        let mut controller = InteractionController::new();
        let markers = scene.markers.clone();
        assert!(controller.select(Some(1), &markers, &mut scene.manipulator));
        assert_eq!(scene.manipulator.sensor(), Some(1));

        let start = scene.ndc(scene.markers[0]);
        scene.dispatch(&mut controller, down(start));
        scene.dispatch(&mut controller, moved(NormalizedPointer::new(start.x, start.y + 0.2)));
        assert!(!controller.select(None, &markers, &mut scene.manipulator));
        assert_eq!(controller.dragged_sensor(), Some(0));
    }
}
