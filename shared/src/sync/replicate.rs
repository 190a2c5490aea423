use crate::ReplicatedField;

/// A plain state container whose replicated fields a [`SyncScheduler`] drives.
///
/// Fields are listed in declaration order and a field's position is its
/// [`FieldId`] on the wire, so both peers must declare the same fields in the
/// same order.
///
/// ```
/// use netvar_shared::{ActorId, Replicate, ReplicatedField, ReplicatedList, ReplicatedValue};
///
/// const SERVER: ActorId = ActorId::new(0);
///
/// struct Door {
///     open: ReplicatedValue<bool>,
///     keys: ReplicatedList<u32>,
/// }
///
/// impl Replicate for Door {
///     fn fields(&self) -> Vec<&dyn ReplicatedField> {
///         vec![&self.open, &self.keys]
///     }
///
///     fn fields_mut(&mut self) -> Vec<&mut dyn ReplicatedField> {
///         vec![&mut self.open, &mut self.keys]
///     }
/// }
///
/// let door = Door {
///     open: ReplicatedValue::authority_only(false, SERVER),
///     keys: ReplicatedList::authority_only(SERVER),
/// };
/// assert_eq!(door.fields().len(), 2);
/// ```
///
/// [`SyncScheduler`]: crate::SyncScheduler
/// [`FieldId`]: crate::FieldId
pub trait Replicate {
    fn fields(&self) -> Vec<&dyn ReplicatedField>;

    fn fields_mut(&mut self) -> Vec<&mut dyn ReplicatedField>;

    /// Called once the scheduler takes ownership
    fn on_attach(&mut self) {}

    /// Called right before the scheduler gives the entity back
    fn on_detach(&mut self) {}
}
