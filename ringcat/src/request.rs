use ringcat_reactor::OpKind;

/// Request is a long-lived descriptor for one kind of operation. It is
/// reused for every submission of that kind and remembers how the most
/// recent one ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    kind: OpKind,
    pending: bool,
    result: Option<i32>,
    submissions: u64,
}

impl Request {
    pub fn new(kind: OpKind) -> Self {
        Self {
            kind,
            pending: false,
            result: None,
            submissions: 0,
        }
    }

    pub fn kind(&self) -> OpKind {
        self.kind
    }

    /// submitted marks the descriptor as in flight and forgets the
    /// previous outcome.
    pub fn submitted(&mut self) {
        debug_assert!(!self.pending, "{} request resubmitted while pending", self.kind);

        self.pending = true;
        self.result = None;
        self.submissions += 1;
    }

    pub fn complete(&mut self, result: i32) {
        self.pending = false;
        self.result = Some(result);
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// result of the most recent completed submission
    pub fn result(&self) -> Option<i32> {
        self.result
    }

    pub fn submissions(&self) -> u64 {
        self.submissions
    }
}
