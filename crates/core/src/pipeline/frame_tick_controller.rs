use std::time::Duration;

use crate::detection::domain::detection_dispatcher::{
    DetectionDispatcher, DetectionError, DetectionResult,
};
use crate::overlay::domain::coordinate_mapper::CoordinateMapper;
use crate::overlay::domain::detection_ingest::{ingest, IngestOutcome};
use crate::overlay::domain::overlay_renderer::{OverlayRenderer, RenderStats};
use crate::overlay::domain::overlay_style::StyleError;
use crate::overlay::domain::phase_state_machine::PhaseStateMachine;
use crate::overlay::domain::slot_store::SlotStore;
use crate::rendering::domain::renderer::Renderer;
use crate::shared::frame::Frame;

/// What happened during one frame tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickReport {
    /// A new detection request was issued this tick.
    pub dispatched: bool,
    /// Outcome of the detection result ingested this tick, if one arrived.
    pub ingest: Option<IngestOutcome>,
    /// A detection request finished with an error this tick.
    pub detection_failed: bool,
    /// Slots that moved to their next phase.
    pub transitions: usize,
    pub render: RenderStats,
}

/// Drives one frame of the scan overlay.
///
/// Each tick, in order:
/// 1. issue a detection request for the frame, unless one is still pending
///    or the detector has gone away;
/// 2. ingest a completed detection result, if any;
/// 3. advance every slot's phase timer;
/// 4. render the overlay.
///
/// Steps 3 and 4 run on every tick whether or not detection produced
/// anything, so progress follows frame count rather than detection latency.
/// The slot store is owned here and only touched from the calling thread.
pub struct FrameTickController {
    slots: SlotStore,
    machine: PhaseStateMachine,
    overlay: OverlayRenderer,
    dispatcher: Box<dyn DetectionDispatcher>,
    detector_available: bool,
    dispatch_count: usize,
    completed_count: usize,
}

impl FrameTickController {
    pub fn new(
        dispatcher: Box<dyn DetectionDispatcher>,
        overlay: OverlayRenderer,
    ) -> Result<Self, StyleError> {
        let machine = PhaseStateMachine::new(overlay.style().progress_step)?;
        Ok(Self {
            slots: SlotStore::new(),
            machine,
            overlay,
            dispatcher,
            detector_available: true,
            dispatch_count: 0,
            completed_count: 0,
        })
    }

    /// Runs one full tick: [`advance`](Self::advance) then
    /// [`render`](Self::render).
    ///
    /// `frame` is the latest detector-space frame, or `None` when the source
    /// has nothing new; detection is then skipped but the overlay still
    /// advances and renders.
    pub fn tick(
        &mut self,
        frame: Option<Frame>,
        mapper: &CoordinateMapper,
        renderer: &mut dyn Renderer,
    ) -> TickReport {
        let mut report = self.advance(frame);
        report.render = self.render(mapper, renderer);
        report
    }

    /// Steps 1 to 3 of a tick, without drawing.
    pub fn advance(&mut self, frame: Option<Frame>) -> TickReport {
        let mut report = TickReport::default();

        if let Some(frame) = frame {
            report.dispatched = self.try_dispatch(frame);
        }

        if let Some(result) = self.dispatcher.poll() {
            self.accept(result, &mut report);
        }

        report.transitions = self.machine.tick_all(&mut self.slots);
        report
    }

    /// Waits up to `timeout` for a request still pending at end of stream
    /// and ingests its result, so the final slot state reflects it.
    ///
    /// No tick follows, so progress is unchanged.
    pub fn finish(&mut self, timeout: Duration) -> TickReport {
        let mut report = TickReport::default();
        if self.detector_available && self.dispatcher.is_in_flight() {
            match self.dispatcher.drain(timeout) {
                Some(result) => self.accept(result, &mut report),
                None => log::warn!("Detection still pending after {timeout:?}; result dropped"),
            }
        }
        report
    }

    fn accept(&mut self, result: DetectionResult, report: &mut TickReport) {
        match result {
            Ok(batch) => {
                self.completed_count += 1;
                let outcome = ingest(&mut self.slots, batch);
                if let IngestOutcome::Cleared { removed } = outcome {
                    if removed > 0 {
                        log::debug!("No face in frame, cleared {removed} slot(s)");
                    }
                }
                report.ingest = Some(outcome);
            }
            Err(DetectionError::Unavailable) => {
                self.mark_unavailable();
                report.detection_failed = true;
            }
            Err(e) => {
                self.completed_count += 1;
                log::warn!("Detection skipped this frame: {e}");
                report.detection_failed = true;
            }
        }
    }

    /// Step 4 of a tick: draws the current slot state.
    pub fn render(&self, mapper: &CoordinateMapper, renderer: &mut dyn Renderer) -> RenderStats {
        self.overlay.render(&self.slots, mapper, renderer)
    }

    fn try_dispatch(&mut self, frame: Frame) -> bool {
        if !self.detector_available || self.dispatcher.is_in_flight() {
            return false;
        }
        match self.dispatcher.dispatch(frame) {
            Ok(()) => {
                self.dispatch_count += 1;
                true
            }
            Err(DetectionError::Unavailable) => {
                self.mark_unavailable();
                false
            }
            Err(e) => {
                log::warn!("Detection request rejected: {e}");
                false
            }
        }
    }

    fn mark_unavailable(&mut self) {
        if self.detector_available {
            log::warn!("Detector unavailable; showing last known state from now on");
        }
        self.detector_available = false;
    }

    pub fn slots(&self) -> &SlotStore {
        &self.slots
    }

    pub fn overlay(&self) -> &OverlayRenderer {
        &self.overlay
    }

    pub fn dispatch_count(&self) -> usize {
        self.dispatch_count
    }

    /// Requests that finished, successfully or not.
    pub fn completed_count(&self) -> usize {
        self.completed_count
    }

    pub fn is_detection_in_flight(&self) -> bool {
        self.dispatcher.is_in_flight()
    }

    pub fn is_detector_available(&self) -> bool {
        self.detector_available
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::detected_face::DetectedFace;
    use crate::detection::domain::face_detector::FaceDetector;
    use crate::detection::infrastructure::inline_dispatcher::InlineDetectionDispatcher;
    use crate::overlay::domain::phase::Phase;
    use crate::rendering::domain::color::Color;
    use crate::rendering::infrastructure::recording_renderer::RecordingRenderer;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    /// Holds each request until the test releases a result for it.
    #[derive(Clone, Default)]
    struct ManualDispatcher {
        state: Arc<Mutex<ManualState>>,
    }

    #[derive(Default)]
    struct ManualState {
        dispatched: Vec<usize>,
        in_flight: bool,
        ready: Option<DetectionResult>,
        overlapping_dispatches: usize,
        unavailable: bool,
    }

    impl ManualDispatcher {
        fn complete(&self, result: DetectionResult) {
            let mut s = self.state.lock().unwrap();
            assert!(s.in_flight, "nothing in flight to complete");
            s.ready = Some(result);
        }

        fn dispatched(&self) -> Vec<usize> {
            self.state.lock().unwrap().dispatched.clone()
        }

        fn overlapping(&self) -> usize {
            self.state.lock().unwrap().overlapping_dispatches
        }

        fn go_away(&self) {
            self.state.lock().unwrap().unavailable = true;
        }
    }

    impl DetectionDispatcher for ManualDispatcher {
        fn dispatch(&mut self, frame: Frame) -> Result<(), DetectionError> {
            let mut s = self.state.lock().unwrap();
            if s.unavailable {
                return Err(DetectionError::Unavailable);
            }
            if s.in_flight {
                s.overlapping_dispatches += 1;
                return Err(DetectionError::Busy);
            }
            s.in_flight = true;
            s.dispatched.push(frame.index());
            Ok(())
        }

        fn poll(&mut self) -> Option<DetectionResult> {
            let mut s = self.state.lock().unwrap();
            let result = s.ready.take()?;
            s.in_flight = false;
            Some(result)
        }

        fn is_in_flight(&self) -> bool {
            self.state.lock().unwrap().in_flight
        }
    }

    /// Returns scripted batches in order, then empty batches.
    struct ScriptedDetector {
        batches: VecDeque<Vec<DetectedFace>>,
    }

    impl FaceDetector for ScriptedDetector {
        fn detect(
            &mut self,
            _frame: &Frame,
        ) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>> {
            Ok(self.batches.pop_front().unwrap_or_default())
        }
    }

    struct FailingDetector;

    impl FaceDetector for FailingDetector {
        fn detect(
            &mut self,
            _frame: &Frame,
        ) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>> {
            Err("model exploded".into())
        }
    }

    // --- Helpers ---

    fn face() -> DetectedFace {
        DetectedFace::from(vec![(10.0, 10.0), (30.0, 10.0), (20.0, 30.0)])
    }

    fn frame(index: usize) -> Frame {
        Frame::blank(64, 48, Color::BLACK, index)
    }

    fn mapper() -> CoordinateMapper {
        CoordinateMapper::new((64, 48), (640, 480)).unwrap()
    }

    fn controller(dispatcher: impl DetectionDispatcher + 'static) -> FrameTickController {
        FrameTickController::new(Box::new(dispatcher), OverlayRenderer::default()).unwrap()
    }

    fn progress_snapshot(c: &FrameTickController) -> Vec<(Phase, f64)> {
        c.slots().iter().map(|s| (s.phase(), s.progress())).collect()
    }

    // --- Tests ---

    #[test]
    fn test_no_second_request_while_one_is_pending() {
        let manual = ManualDispatcher::default();
        let mut c = controller(manual.clone());
        let mapper = mapper();
        let mut rec = RecordingRenderer::new();

        assert!(c.tick(Some(frame(0)), &mapper, &mut rec).dispatched);
        for i in 1..10 {
            let report = c.tick(Some(frame(i)), &mapper, &mut rec);
            assert!(!report.dispatched);
            assert!(c.is_detection_in_flight());
        }
        assert_eq!(manual.dispatched(), vec![0]);
        assert_eq!(manual.overlapping(), 0);
        assert_eq!(c.dispatch_count(), 1);

        manual.complete(Ok(vec![face()]));
        let report = c.tick(Some(frame(10)), &mapper, &mut rec);
        assert!(!report.dispatched, "result is polled after the dispatch step");
        assert!(matches!(report.ingest, Some(IngestOutcome::Updated { faces: 1, added: 1 })));
        assert_eq!(c.completed_count(), 1);

        assert!(c.tick(Some(frame(11)), &mapper, &mut rec).dispatched);
        assert_eq!(manual.dispatched(), vec![0, 11]);
        assert_eq!(manual.overlapping(), 0);
    }

    #[test]
    fn test_pending_window_only_ticks_existing_slots() {
        let manual = ManualDispatcher::default();
        let mut c = controller(manual.clone());
        let mapper = mapper();
        let mut rec = RecordingRenderer::new();

        c.tick(Some(frame(0)), &mapper, &mut rec);
        manual.complete(Ok(vec![face(), face()]));
        c.tick(Some(frame(1)), &mapper, &mut rec);
        c.tick(Some(frame(2)), &mapper, &mut rec); // new request now pending

        let before = progress_snapshot(&c);
        for i in 3..8 {
            let report = c.tick(Some(frame(i)), &mapper, &mut rec);
            assert_eq!(report.ingest, None);
        }
        let after = progress_snapshot(&c);

        assert_eq!(before.len(), 2);
        assert_eq!(after.len(), 2);
        for ((_, p0), (phase, p1)) in before.iter().zip(&after) {
            assert_eq!(*phase, Phase::Scanning);
            assert!((p1 - p0 - 2.5).abs() < 1e-9);
        }
    }

    #[test]
    fn test_tick_and_render_run_without_frames() {
        let manual = ManualDispatcher::default();
        let mut c = controller(manual.clone());
        let mapper = mapper();
        let mut rec = RecordingRenderer::new();

        c.tick(Some(frame(0)), &mapper, &mut rec);
        manual.complete(Ok(vec![face()]));
        c.tick(None, &mapper, &mut rec);

        let mut rec = RecordingRenderer::new();
        let report = c.tick(None, &mapper, &mut rec);
        assert!(!report.dispatched);
        assert_eq!(report.render.bars, 1);
        assert!((c.slots().get(0).progress() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_inline_dispatch_is_ingested_same_tick() {
        let detector = ScriptedDetector {
            batches: VecDeque::from(vec![vec![face()]]),
        };
        let mut c = controller(InlineDetectionDispatcher::new(Box::new(detector)));
        let mut rec = RecordingRenderer::new();

        let report = c.tick(Some(frame(0)), &mapper(), &mut rec);
        assert!(report.dispatched);
        assert!(matches!(report.ingest, Some(IngestOutcome::Updated { .. })));
        // Ingested then ticked once
        assert!((c.slots().get(0).progress() - 0.5).abs() < 1e-9);
        assert_eq!(c.dispatch_count(), 1);
        assert_eq!(c.completed_count(), 1);
    }

    #[test]
    fn test_end_to_end_lifecycle() {
        let manual = ManualDispatcher::default();
        let mut c = controller(manual.clone());
        let mapper = mapper();
        let mut rec = RecordingRenderer::new();

        // Two faces arrive
        c.tick(Some(frame(0)), &mapper, &mut rec);
        manual.complete(Ok(vec![face(), face()]));
        c.tick(None, &mapper, &mut rec);
        assert_eq!(c.slots().len(), 2);
        // Ingest happens before the tick of the same frame
        for slot in c.slots().iter() {
            assert_eq!(slot.phase(), Phase::Scanning);
            assert!((slot.progress() - 0.5).abs() < 1e-9);
        }

        // 199 more ticks: exactly 200 since the slots were created
        for _ in 0..199 {
            c.tick(None, &mapper, &mut rec);
        }
        for slot in c.slots().iter() {
            assert_eq!(slot.phase(), Phase::Gathering);
            assert_eq!(slot.progress(), 0.0);
        }

        // Subject lost
        c.tick(Some(frame(300)), &mapper, &mut rec);
        manual.complete(Ok(vec![]));
        let mut rec = RecordingRenderer::new();
        let report = c.tick(None, &mapper, &mut rec);
        assert_eq!(report.ingest, Some(IngestOutcome::Cleared { removed: 2 }));
        assert_eq!(c.slots().len(), 0);
        assert_eq!(rec.texts(), vec!["NO FACE DETECTED"]);
        assert_eq!(rec.commands().len(), 1);

        // New subject starts from scratch
        c.tick(Some(frame(302)), &mapper, &mut rec);
        manual.complete(Ok(vec![face()]));
        c.tick(None, &mapper, &mut rec);
        assert_eq!(c.slots().len(), 1);
        assert_eq!(c.slots().get(0).phase(), Phase::Scanning);
        assert!((c.slots().get(0).progress() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_failed_detection_keeps_state_and_allows_retry() {
        let mut c = controller(InlineDetectionDispatcher::new(Box::new(FailingDetector)));
        let mut rec = RecordingRenderer::new();

        let report = c.tick(Some(frame(0)), &mapper(), &mut rec);
        assert!(report.detection_failed);
        assert_eq!(report.ingest, None);
        assert!(report.render.no_subject);
        assert!(c.is_detector_available());

        assert!(c.tick(Some(frame(1)), &mapper(), &mut rec).dispatched);
        assert_eq!(c.dispatch_count(), 2);
        assert_eq!(c.completed_count(), 2);
    }

    #[test]
    fn test_unavailable_detector_stops_requests_but_keeps_rendering() {
        let manual = ManualDispatcher::default();
        let mut c = controller(manual.clone());
        let mapper = mapper();
        let mut rec = RecordingRenderer::new();

        c.tick(Some(frame(0)), &mapper, &mut rec);
        manual.complete(Ok(vec![face()]));
        c.tick(None, &mapper, &mut rec);

        manual.go_away();
        let report = c.tick(Some(frame(2)), &mapper, &mut rec);
        assert!(!report.dispatched);
        assert!(!c.is_detector_available());

        let progress = c.slots().get(0).progress();
        let mut rec = RecordingRenderer::new();
        c.tick(Some(frame(3)), &mapper, &mut rec);
        assert_eq!(manual.dispatched(), vec![0]);
        assert!(c.slots().get(0).progress() > progress);
        assert_eq!(rec.line_count(), 2);
    }

    #[test]
    fn test_finish_ingests_pending_result_without_ticking() {
        let manual = ManualDispatcher::default();
        let mut c = controller(manual.clone());
        let mut rec = RecordingRenderer::new();

        c.tick(Some(frame(0)), &mapper(), &mut rec);
        manual.complete(Ok(vec![face(), face()]));

        let report = c.finish(Duration::from_millis(10));
        assert_eq!(report.ingest, Some(IngestOutcome::Updated { faces: 2, added: 2 }));
        assert_eq!(report.transitions, 0);
        assert_eq!(c.slots().len(), 2);
        assert_eq!(c.slots().get(0).progress(), 0.0);
        assert_eq!(c.completed_count(), 1);
        assert!(!c.is_detection_in_flight());
    }

    #[test]
    fn test_finish_with_nothing_pending_is_a_no_op() {
        let manual = ManualDispatcher::default();
        let mut c = controller(manual.clone());
        assert_eq!(c.finish(Duration::from_millis(10)), TickReport::default());

        // Still pending after the wait: nothing ingested
        let mut rec = RecordingRenderer::new();
        c.tick(Some(frame(0)), &mapper(), &mut rec);
        assert_eq!(c.finish(Duration::from_millis(10)).ingest, None);
        assert!(c.is_detection_in_flight());
    }
}
