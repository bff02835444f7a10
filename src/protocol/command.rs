use bytes::Bytes;

/// A single store command: name followed by binary-safe arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    args: Vec<Bytes>,
}

impl Command {
    pub fn new(name: &'static str) -> Self {
        Self {
            args: vec![Bytes::from_static(name.as_bytes())],
        }
    }

    pub fn arg<A: AsRef<[u8]>>(mut self, arg: A) -> Self {
        self.args.push(Bytes::copy_from_slice(arg.as_ref()));
        self
    }

    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: AsRef<[u8]>,
    {
        self.args
            .extend(args.into_iter().map(|a| Bytes::copy_from_slice(a.as_ref())));
        self
    }

    /// Owned argument, moved in without copying
    pub fn arg_bytes(mut self, arg: Vec<u8>) -> Self {
        self.args.push(Bytes::from(arg));
        self
    }

    pub fn arg_int<N: ToString>(self, n: N) -> Self {
        self.arg(n.to_string())
    }

    /// Command name as sent, e.g. "GET" or "SENTINEL"
    pub fn name(&self) -> String {
        String::from_utf8_lossy(&self.args[0]).into_owned()
    }

    pub fn as_args(&self) -> &[Bytes] {
        &self.args
    }
}
