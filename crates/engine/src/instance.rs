use std::sync::Arc;

use core_types::{InstanceId, Millis, SurfaceKind};
use markup::{TypedUnit, strip_comments, string_to_units, unit_count};
use render::{Edge, MoveSpec, RenderTarget, calculate_cursor_steps};

use crate::action::{Action, ActionMeta, Operation};
use crate::control::{AbortReason, InstanceHandle, RunOutcome, Status};
use crate::options::{Callbacks, Delay, Options, OptionsPatch};
use crate::pace::{Pace, Pacer};
use crate::queue::Queue;
use crate::style_registry::{CursorStyle, StyleRegistry};
use crate::timer::{SystemTimer, TimerOutcome, TimerService};
use crate::visibility::{InitOutcome, VisibilityProbe};

/// One typing animation bound to one render target.
///
/// Runs on the caller's thread: `init`/`fire` block in the timer between actions and return
/// once the queue is exhausted, or when the instance is frozen or destroyed through its
/// [`InstanceHandle`].
pub struct Instance {
    id: InstanceId,
    options: Options,
    callbacks: Callbacks,
    queue: Queue,
    target: Box<dyn RenderTarget + Send>,
    timer: Arc<dyn TimerService>,
    handle: InstanceHandle,
    styles: StyleRegistry,
    visibility: Option<Arc<dyn VisibilityProbe>>,
    pacer: Pacer,
    pace: Pace,
    /// Characters between the cursor and the end of the content.
    cursor: usize,
}

/// Collaborators and settings for [`Instance::build`].
pub struct InstanceConfig {
    pub id: InstanceId,
    pub options: Options,
    pub callbacks: Callbacks,
    pub timer: Arc<dyn TimerService>,
    pub styles: StyleRegistry,
    pub visibility: Option<Arc<dyn VisibilityProbe>>,
}

impl InstanceConfig {
    pub fn new(id: InstanceId, options: Options) -> Self {
        Self {
            id,
            options,
            callbacks: Callbacks::default(),
            timer: Arc::new(SystemTimer::new()),
            styles: StyleRegistry::new(),
            visibility: None,
        }
    }

    pub fn callbacks(mut self, callbacks: Callbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn timer(mut self, timer: Arc<dyn TimerService>) -> Self {
        self.timer = timer;
        self
    }

    pub fn styles(mut self, styles: StyleRegistry) -> Self {
        self.styles = styles;
        self
    }

    pub fn visibility(mut self, probe: Arc<dyn VisibilityProbe>) -> Self {
        self.visibility = Some(probe);
        self
    }
}

impl Instance {
    pub fn new(id: InstanceId, target: impl RenderTarget + Send + 'static, options: Options) -> Self {
        Self::build(InstanceConfig::new(id, options), Box::new(target))
    }

    pub fn build(config: InstanceConfig, target: Box<dyn RenderTarget + Send>) -> Self {
        Self::assemble(config, target, None)
    }

    fn assemble(
        config: InstanceConfig,
        target: Box<dyn RenderTarget + Send>,
        replay: Option<Vec<Action>>,
    ) -> Self {
        let InstanceConfig {
            id,
            mut options,
            callbacks,
            timer,
            styles,
            visibility,
        } = config;
        if target.kind() == SurfaceKind::Input {
            options.html = false;
        }
        let home = Action::pause(options.start_delay);
        let has_replay = replay.is_some();
        let queue = match replay {
            Some(waiting) => Queue::with_waiting(home, waiting),
            None => Queue::new(home),
        };
        let seed = options.jitter_seed.unwrap_or(id.as_raw());

        let mut instance = Self {
            id,
            handle: InstanceHandle::new(id, styles.clone()),
            options,
            callbacks,
            queue,
            target,
            timer,
            styles,
            visibility,
            pacer: Pacer::new(seed),
            pace: Pace::default(),
            cursor: 0,
        };

        let existing = instance.target.current_markup();
        instance.target.write("");
        if has_replay {
            return instance;
        }
        instance.handle_existing_content(&existing);
        if instance.options.html {
            instance.options.strings = instance
                .options
                .strings
                .iter()
                .map(|s| strip_comments(s))
                .collect();
        }
        if !instance.options.strings.is_empty() {
            instance.generate_queue();
        }
        log::debug!(
            target: "typist.engine",
            "instance {id} built with {} queued action(s)",
            instance.queue.len()
        );
        instance
    }

    /// A fresh instance over the same target and options that replays everything queued so far.
    pub fn reset(mut self) -> Instance {
        self.handle.destroy();
        self.queue.reset();
        let waiting = self.queue.waiting().to_vec();
        let config = InstanceConfig {
            id: self.id,
            options: self.options,
            callbacks: self.callbacks,
            timer: self.timer,
            styles: self.styles,
            visibility: self.visibility,
        };
        Instance::assemble(config, self.target, Some(waiting))
    }

    fn handle_existing_content(&mut self, existing: &str) {
        if existing.is_empty() {
            return;
        }
        if self.options.start_delete {
            for unit in string_to_units(existing, self.options.html) {
                self.target.append(&unit);
            }
            self.queue.add(Action::delete_all(), false);
            self.add_split_pause(1, 1);
            return;
        }
        self.options.strings.insert(0, existing.trim().to_string());
    }

    fn generate_queue(&mut self) {
        let strings = self.options.strings.clone();
        for (index, string) in strings.iter().enumerate() {
            self.queue_string(string);
            let start = self.queue.len();
            if index + 1 == strings.len() {
                break;
            }
            if self.options.break_lines {
                self.queue.add(Action::type_unit(TypedUnit::Plain('\n')), false);
                self.add_split_pause(start, 1);
                continue;
            }
            let count = unit_count(string, self.options.html);
            for _ in 0..count {
                self.queue.add(Action::delete(), false);
            }
            self.add_split_pause(start, count);
        }
    }

    fn queue_string(&mut self, string: &str) {
        let units = string_to_units(string, self.options.html);
        let last = units.len().saturating_sub(1);
        for (index, unit) in units.into_iter().enumerate() {
            let meta = ActionMeta {
                is_first: index == 0,
                is_last: index == last,
                is_phantom: false,
            };
            self.queue
                .add(Action::with_meta(Operation::Type(unit), meta), false);
        }
    }

    fn add_split_pause(&mut self, start: usize, count: usize) {
        let delay = self.options.next_string_delay;
        self.queue.wrap_with_pauses(
            start..start + count,
            Action::pause(delay.before),
            Action::pause(delay.after),
        );
    }

    // Companion builders. Each appends to the end of the queue.

    pub fn type_str(&mut self, string: &str) -> &mut Self {
        self.queue_string(string);
        self
    }

    pub fn delete_chars(&mut self, count: usize) -> &mut Self {
        for _ in 0..count {
            self.queue.add(Action::delete(), false);
        }
        self
    }

    pub fn delete_all(&mut self) -> &mut Self {
        self.queue.add(Action::delete_all(), false);
        self
    }

    pub fn pause_for(&mut self, ms: Millis) -> &mut Self {
        self.queue.add(Action::pause(ms), false);
        self
    }

    pub fn break_line(&mut self) -> &mut Self {
        self.queue
            .add(Action::type_unit(TypedUnit::Plain('\n')), false);
        self
    }

    pub fn empty(&mut self) -> &mut Self {
        self.queue.add(Action::new(Operation::Empty), false);
        self
    }

    pub fn move_cursor(&mut self, spec: MoveSpec, to: Edge) -> &mut Self {
        self.queue
            .add(Action::new(Operation::MoveCursor { spec, to }), false);
        self
    }

    pub fn queue_options(&mut self, patch: OptionsPatch) -> &mut Self {
        self.queue
            .add(Action::new(Operation::SetOptions(patch)), false);
        self
    }

    // Accessors.

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    /// Mutable access for callers splicing actions before the run starts.
    pub fn queue_mut(&mut self) -> &mut Queue {
        &mut self.queue
    }

    pub fn target(&self) -> &dyn RenderTarget {
        &*self.target
    }

    pub fn text(&self) -> String {
        self.target.text()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn pace(&self) -> Pace {
        self.pace
    }

    pub fn status(&self) -> Status {
        self.handle.status()
    }

    pub fn handle(&self) -> InstanceHandle {
        self.handle.clone()
    }

    pub fn styles(&self) -> &StyleRegistry {
        &self.styles
    }

    pub fn now(&self) -> Millis {
        self.timer.now()
    }

    // Lifecycle.

    /// Start once. Deferred while `wait_until_visible` is set and the probe reports hidden.
    pub fn init(&mut self) -> InitOutcome {
        if self.status().started {
            return InitOutcome::AlreadyStarted;
        }
        self.register_cursor_style();
        if self.options.wait_until_visible && !self.probe_visible() {
            log::debug!(target: "typist.engine", "instance {} deferred until visible", self.id);
            return InitOutcome::Deferred;
        }
        self.start()
    }

    /// Called by the driver whenever visibility may have changed.
    pub fn notify_visibility(&mut self) -> InitOutcome {
        if self.status().started {
            return InitOutcome::AlreadyStarted;
        }
        if !self.probe_visible() {
            return InitOutcome::Deferred;
        }
        self.start()
    }

    fn probe_visible(&self) -> bool {
        self.visibility.as_ref().is_none_or(|probe| probe.is_visible())
    }

    fn start(&mut self) -> InitOutcome {
        if !self.handle.mark_started() {
            return InitOutcome::AlreadyStarted;
        }
        InitOutcome::Ran(self.fire())
    }

    pub fn pause(&self) {
        self.handle.pause();
    }

    /// Clear the frozen flag and continue from the first waiting action.
    pub fn resume(&mut self) -> RunOutcome {
        self.handle.unpause();
        if self.handle.is_destroyed() {
            return RunOutcome::Aborted(AbortReason::Destroyed);
        }
        self.handle.mark_started();
        self.fire()
    }

    pub fn destroy(&self) {
        self.handle.destroy();
    }

    fn register_cursor_style(&self) {
        if self.target.kind() == SurfaceKind::Input {
            return;
        }
        self.styles.register(
            self.id,
            CursorStyle {
                cursor_char: self.options.cursor_char.clone(),
                blink_period: self.options.cursor_speed,
                visible: self.options.cursor,
            },
        );
    }

    /// Run the queue to completion, looping when configured.
    pub fn fire(&mut self) -> RunOutcome {
        log::debug!(target: "typist.engine", "instance {} firing", self.id);
        loop {
            if let RunOutcome::Aborted(reason) = self.run_waiting() {
                log::debug!(target: "typist.engine", "instance {} aborted: {reason:?}", self.id);
                return RunOutcome::Aborted(reason);
            }
            self.handle.mark_complete();
            if let Some(after_complete) = self.callbacks.after_complete.clone() {
                after_complete(self);
            }
            if !self.options.looping {
                return RunOutcome::Completed;
            }
            let delay = self.options.effective_loop_delay();
            if let Some(reason) = self.handle.abort_reason().or_else(|| self.sleep(delay.after)) {
                log::debug!(target: "typist.engine", "instance {} aborted: {reason:?}", self.id);
                return RunOutcome::Aborted(reason);
            }
            self.loopify(delay);
        }
    }

    /// Replay from the start: erase what is on screen with phantom deletes, wait, retype.
    fn loopify(&mut self, delay: Delay) {
        self.queue
            .reset()
            .delete(0)
            .add(Action::pause(delay.before), true);
        self.cursor = 0;
        let on_screen = self.target.char_count();
        for _ in 0..on_screen {
            self.queue.add(Action::phantom_delete(), true);
        }
        log::debug!(
            target: "typist.engine",
            "instance {} looping, erasing {on_screen} character(s)",
            self.id
        );
    }

    fn run_waiting(&mut self) -> RunOutcome {
        while let Some(action) = self.queue.front().cloned() {
            if let Some(reason) = self.handle.abort_reason() {
                return RunOutcome::Aborted(reason);
            }
            self.apply_pending_updates();
            self.set_pace();

            if action.meta.is_first
                && let Some(before_string) = self.callbacks.before_string.clone()
            {
                before_string(&action, &self.queue, self);
            }
            if let Some(before_step) = self.callbacks.before_step.clone() {
                before_step(&action, &self.queue, self);
            }

            log::trace!(target: "typist.engine", "instance {}: {}", self.id, action.label());
            if let Some(reason) = self.execute(&action) {
                return RunOutcome::Aborted(reason);
            }

            let Some(done) = self.queue.shift() else {
                break;
            };
            if done.is_phantom() {
                continue;
            }
            if done.meta.is_last
                && let Some(after_string) = self.callbacks.after_string.clone()
            {
                after_string(&done, &self.queue, self);
            }
            if let Some(after_step) = self.callbacks.after_step.clone() {
                after_step(&done, &self.queue, self);
            }
            self.queue.record_executed(done);
        }
        RunOutcome::Completed
    }

    fn apply_pending_updates(&mut self) {
        for patch in self.handle.take_pending_updates() {
            self.apply_options(&patch);
        }
    }

    fn apply_options(&mut self, patch: &OptionsPatch) {
        self.options.apply(patch);
        if let Some(seed) = patch.jitter_seed {
            self.pacer = Pacer::new(seed);
        }
        if self.styles.contains(self.id) {
            self.register_cursor_style();
        }
    }

    fn set_pace(&mut self) {
        self.pace = self.pacer.pace(
            self.options.speed,
            self.options.delete_pace(),
            self.options.life_like,
        );
    }

    /// Mutate the target, then hold for the action's delay.
    fn execute(&mut self, action: &Action) -> Option<AbortReason> {
        match &action.op {
            Operation::Type(unit) => {
                self.target.insert_at(unit, self.cursor);
                self.sleep(self.pace.typing)
            }
            Operation::Delete { until_empty: false } => {
                self.target.remove_before(self.cursor);
                self.sleep(self.pace.deleting)
            }
            Operation::Delete { until_empty: true } => self.delete_until_empty(),
            Operation::Pause(ms) => {
                self.sleep(ms.unwrap_or(self.options.next_string_delay.total))
            }
            Operation::SetOptions(patch) => {
                self.apply_options(patch);
                None
            }
            Operation::MoveCursor { spec, to } => self.walk_cursor(spec, *to),
            Operation::Empty => {
                self.target.write("");
                self.cursor = 0;
                None
            }
        }
    }

    fn delete_until_empty(&mut self) -> Option<AbortReason> {
        let budget = self.target.char_count();
        if budget == 0 {
            return self.sleep(self.pace.deleting);
        }
        // Everything goes, including characters right of a moved cursor.
        self.cursor = 0;
        for _ in 0..budget {
            if self.target.remove_last().is_none() {
                break;
            }
            if let Some(reason) = self.sleep(self.pace.deleting) {
                return Some(reason);
            }
        }
        None
    }

    fn walk_cursor(&mut self, spec: &MoveSpec, to: Edge) -> Option<AbortReason> {
        let steps = calculate_cursor_steps(&*self.target, spec, self.cursor, to);
        let max = self.target.char_count();
        let toward_start = steps > 0;
        for _ in 0..steps.unsigned_abs() {
            let next = if toward_start {
                (self.cursor + 1).min(max)
            } else {
                self.cursor.saturating_sub(1)
            };
            if next == self.cursor {
                break;
            }
            self.cursor = next;
            if let Some(reason) = self.sleep(self.pace.typing) {
                return Some(reason);
            }
        }
        None
    }

    /// Hold for `ms`, tracked so `destroy` can cut it short.
    fn sleep(&self, ms: Millis) -> Option<AbortReason> {
        let handle = self.timer.schedule_after(ms);
        self.handle.track(&handle);
        let outcome = self.timer.wait(&handle);
        self.handle.release(&handle);
        match outcome {
            TimerOutcome::Elapsed => None,
            TimerOutcome::Cancelled => {
                Some(self.handle.abort_reason().unwrap_or(AbortReason::Destroyed))
            }
        }
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("id", &self.id)
            .field("status", &self.status())
            .field("waiting", &self.queue.len())
            .field("executed", &self.queue.executed().len())
            .field("cursor", &self.cursor)
            .finish()
    }
}
