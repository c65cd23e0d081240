//! Programmable transaction model
//!
//! Mirrors the ledger's transaction-kind layout so the kind can be BCS-encoded
//! for dry runs, and serialises to JSON for the external signer.

use crate::error::{Context, Error, Result};
use crate::types::{ObjectId, ObjectRef, SharedObjectRef, SuiAddress, TypeTag};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Serialize;

/// Transaction input
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CallArg {
    /// BCS-encoded pure value
    Pure(Vec<u8>),
    Object(ObjectArg),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ObjectArg {
    ImmOrOwnedObject(ObjectRef),
    SharedObject {
        id: ObjectId,
        initial_shared_version: u64,
        mutable: bool,
    },
}

impl ObjectArg {
    fn id(&self) -> ObjectId {
        match self {
            ObjectArg::ImmOrOwnedObject(object_ref) => object_ref.object_id,
            ObjectArg::SharedObject { id, .. } => *id,
        }
    }
}

impl From<SharedObjectRef> for ObjectArg {
    fn from(shared: SharedObjectRef) -> Self {
        ObjectArg::SharedObject {
            id: shared.object_id,
            initial_shared_version: shared.initial_shared_version,
            mutable: shared.mutable,
        }
    }
}

impl From<ObjectRef> for ObjectArg {
    fn from(object_ref: ObjectRef) -> Self {
        ObjectArg::ImmOrOwnedObject(object_ref)
    }
}

/// Reference to a value inside the transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Argument {
    GasCoin,
    Input(u16),
    Result(u16),
    NestedResult(u16, u16),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgrammableMoveCall {
    pub package: ObjectId,
    pub module: String,
    pub function: String,
    pub type_arguments: Vec<TypeTag>,
    pub arguments: Vec<Argument>,
}

/// Commands used by donation transactions; order matches the ledger layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Command {
    MoveCall(Box<ProgrammableMoveCall>),
    TransferObjects(Vec<Argument>, Argument),
    SplitCoins(Argument, Vec<Argument>),
    MergeCoins(Argument, Vec<Argument>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgrammableTransaction {
    pub inputs: Vec<CallArg>,
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TransactionKind {
    ProgrammableTransaction(ProgrammableTransaction),
}

/// Fully qualified Move function
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveTarget {
    pub package: ObjectId,
    pub module: String,
    pub function: String,
}

impl MoveTarget {
    pub fn new(package: ObjectId, module: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            package,
            module: module.into(),
            function: function.into(),
        }
    }
}

impl std::fmt::Display for MoveTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{}::{}", self.package, self.module, self.function)
    }
}

/// Incrementally assembles a programmable transaction
#[derive(Debug, Default)]
pub struct PtbBuilder {
    inputs: Vec<CallArg>,
    commands: Vec<Command>,
}

impl PtbBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a BCS-encoded pure input
    pub fn pure<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<Argument> {
        let bytes = bcs::to_bytes(value)
            .context("Failed to encode pure argument")
            .map_err(Error::from)?;
        self.push_input(CallArg::Pure(bytes))
    }

    /// Add an object input; the same object is only referenced once
    pub fn object(&mut self, arg: impl Into<ObjectArg>) -> Result<Argument> {
        let arg = arg.into();
        let existing = self.inputs.iter().position(|input| {
            matches!(input, CallArg::Object(obj) if obj.id() == arg.id())
        });

        match existing {
            Some(index) => {
                // upgrade to mutable access if any use needs it
                if let (
                    CallArg::Object(ObjectArg::SharedObject { mutable, .. }),
                    ObjectArg::SharedObject { mutable: true, .. },
                ) = (&mut self.inputs[index], arg)
                {
                    *mutable = true;
                }
                Ok(Argument::Input(index as u16))
            }
            None => self.push_input(CallArg::Object(arg)),
        }
    }

    pub fn command(&mut self, command: Command) -> Argument {
        self.commands.push(command);
        Argument::Result((self.commands.len() - 1) as u16)
    }

    /// Split `amounts` off `coin`, returning one nested result per amount
    pub fn split_coins(&mut self, coin: Argument, amounts: Vec<Argument>) -> Vec<Argument> {
        let count = amounts.len();
        let Argument::Result(index) = self.command(Command::SplitCoins(coin, amounts)) else {
            unreachable!("command always yields a result");
        };
        (0..count as u16)
            .map(|i| Argument::NestedResult(index, i))
            .collect()
    }

    pub fn merge_coins(&mut self, target: Argument, sources: Vec<Argument>) {
        self.command(Command::MergeCoins(target, sources));
    }

    pub fn move_call(
        &mut self,
        target: &MoveTarget,
        type_arguments: Vec<TypeTag>,
        arguments: Vec<Argument>,
    ) -> Argument {
        self.command(Command::MoveCall(Box::new(ProgrammableMoveCall {
            package: target.package,
            module: target.module.clone(),
            function: target.function.clone(),
            type_arguments,
            arguments,
        })))
    }

    pub fn finish(self) -> ProgrammableTransaction {
        ProgrammableTransaction {
            inputs: self.inputs,
            commands: self.commands,
        }
    }

    fn push_input(&mut self, arg: CallArg) -> Result<Argument> {
        let index = u16::try_from(self.inputs.len())
            .map_err(|_| Error::validation("transaction", "too many inputs"))?;
        self.inputs.push(arg);
        Ok(Argument::Input(index))
    }
}

/// Unsigned donation transaction handed to the signer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DonationTransaction {
    pub sender: SuiAddress,
    pub kind: ProgrammableTransaction,
    /// Gas coins chosen by the builder; empty lets the signer pick
    pub gas_payment: Vec<ObjectRef>,
    /// Gas budget in MIST; `None` lets the signer estimate
    pub gas_budget: Option<u64>,
}

impl DonationTransaction {
    /// BCS encoding of the transaction kind, as accepted by dev-inspect
    pub fn kind_bytes(&self) -> Result<Vec<u8>> {
        let kind = TransactionKind::ProgrammableTransaction(self.kind.clone());
        let bytes = bcs::to_bytes(&kind)
            .context("Failed to encode transaction kind")
            .map_err(Error::from)?;
        Ok(bytes)
    }

    pub fn kind_base64(&self) -> Result<String> {
        Ok(BASE64.encode(self.kind_bytes()?))
    }

    /// Move calls in command order
    pub fn move_calls(&self) -> impl Iterator<Item = &ProgrammableMoveCall> {
        self.kind.commands.iter().filter_map(|command| match command {
            Command::MoveCall(call) => Some(call.as_ref()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ObjectDigest;

    fn owned(byte: u8) -> ObjectRef {
        ObjectRef {
            object_id: ObjectId::new([byte; 32]),
            version: 3,
            digest: ObjectDigest([byte; 32]),
        }
    }

    #[test]
    fn test_object_inputs_are_deduplicated() {
        let mut ptb = PtbBuilder::new();
        let shared = SharedObjectRef::new(ObjectId::new([1; 32]), 5, false);
        let a = ptb.object(shared).unwrap();
        let b = ptb.object(SharedObjectRef { mutable: true, ..shared }).unwrap();
        let c = ptb.object(owned(2)).unwrap();
        assert_eq!(a, b);
        assert_eq!(c, Argument::Input(1));

        let tx = ptb.finish();
        assert_eq!(tx.inputs.len(), 2);
        assert!(matches!(
            tx.inputs[0],
            CallArg::Object(ObjectArg::SharedObject { mutable: true, .. })
        ));
    }

    #[test]
    fn test_split_returns_nested_results() {
        let mut ptb = PtbBuilder::new();
        let amount = ptb.pure(&10u64).unwrap();
        let parts = ptb.split_coins(Argument::GasCoin, vec![amount, amount]);
        assert_eq!(
            parts,
            vec![Argument::NestedResult(0, 0), Argument::NestedResult(0, 1)]
        );
    }

    #[test]
    fn test_pure_encoding() {
        let mut ptb = PtbBuilder::new();
        ptb.pure(&Some(30u64)).unwrap();
        ptb.pure(&None::<u64>).unwrap();
        let tx = ptb.finish();
        assert_eq!(tx.inputs[0], CallArg::Pure(vec![1, 30, 0, 0, 0, 0, 0, 0, 0]));
        assert_eq!(tx.inputs[1], CallArg::Pure(vec![0]));
    }

    #[test]
    fn test_kind_bytes_layout() {
        let mut ptb = PtbBuilder::new();
        let coin = ptb.object(owned(4)).unwrap();
        let amount = ptb.pure(&1u64).unwrap();
        ptb.split_coins(coin, vec![amount]);
        let tx = DonationTransaction {
            sender: ObjectId::new([8; 32]),
            kind: ptb.finish(),
            gas_payment: vec![],
            gas_budget: None,
        };

        let bytes = tx.kind_bytes().unwrap();
        // kind variant, input count, object call arg, owned object arg
        assert_eq!(&bytes[..4], &[0, 2, 1, 0]);
        assert!(!tx.kind_base64().unwrap().is_empty());
        assert_eq!(tx.move_calls().count(), 0);
    }
}
