/*!

This is the long-form manual for `assembly_voting` and `adrvote`.

## Running a tally

```bash
adrvote votes/raw/ag_2024_03.csv votes/results/ag_2024_03.txt
```

The first argument is the export of the voting form, the second is the report
to write. The roster of the representatives is read from the roster cache
(`res/studentreps.csv` by default).

When the roster changed, pass the new roster with `--reps`. The sections and
the emails of all the representatives are then looked up again in the
directory, and the cache is rewritten:

```bash
adrvote votes/raw/ag_2024_03.csv votes/results/ag_2024_03.txt --reps res/studentreps_new.csv
```

The sections are looked up in the section lists stored under
`res/sectionlists`, one file per section. Refresh them from the directory with
`--refresh-section-lists`.

## Input formats

### Roster

A CSV file with a header row:

```text
Name,Sciper,Section,Email,Présence
Anna Meier,123456,cms,anna.meier@epfl.ch,TRUE
Bruno Keller,234567,sv,bruno.keller@epfl.ch,FALSE
```

`Name` and `Sciper` are mandatory. `Section`, `Email` and `Présence` are
filled in by the resolution and may be absent from a new roster. The names of
the columns can be changed in the configuration.

### Ballots

The export of the form, in CSV or in Excel (`.xlsx`). The first row contains
the names of the columns. One column contains the email of the voter
(`Adresse e-mail` by default). Each other column is a question:

- if its name contains `DECISION`, the answers are tallied by majority. An
  answer containing `Yes` is a yes, otherwise an answer containing `No` is a
  no, otherwise it is neutral.
- else if its name contains `PREFERENCES`, the answers must be integers and
  their mean is reported.
- any other column is ignored.

A ballot is counted for a question if the email belongs to a representative
and the answer is not empty. All the other ballots are listed in the log.

## Report

```text
votes/results/ag_2024_03.txt

DECISION: adoption of the budget
Total: YES (Yes: 2/3: 66.67% / No: 1/3: 33.33% / Neutral: 0).
Per section group:
cms: YES (Yes: 1/1: 100.00% / No: 0/1: 0.00% / Neutral: 0).
ar: no vote (Yes: 0 / No: 0 / Neutral: 0).
...

PREFERENCES: venue of the next assembly
Total: 5.0/10 (Sum: 15 with 3).
Per section group:
cms: 8.0/10 (Sum: 8 with 1).
ar: no data/10 (Sum: 0 with 0).
...
```

A group without any valid ballot reports `no vote` for a decision and
`no data` for a preference.

## Configuration

`adrvote` comes with the defaults of the assembly. A configuration file in
JSON can be passed with `--config`. All the keys are optional:

```json
{
  "onlineVote": false,
  "hideSectionDecisionVotes": false,
  "hideSectionPreferenceVotes": true,
  "sectionMatch": "lastMatch",
  "emailColumn": "Adresse e-mail",
  "decisionMarker": "DECISION",
  "preferencesMarker": "PREFERENCES",
  "scoreScale": 10,
  "repsCachePath": "res/studentreps.csv",
  "sectionListsFolder": "res/sectionlists",
  "emailDomain": "epfl.ch",
  "sectionListUrl": "https://cadiwww.epfl.ch/listes/viewlist?list=etudiants.{section}@epfl.ch",
  "peopleUrl": "https://people.epfl.ch/{id}",
  "repColumns": {
    "name": "Name",
    "identifier": "Sciper",
    "section": "Section",
    "email": "Email",
    "presence": "Présence"
  }
}
```

- `onlineVote`: when `false`, only the representatives marked as present can vote.
- `sectionMatch`: when a name appears in several section lists, or an email
 belongs to several representatives, `lastMatch` keeps the last one in the
 order of the sections (or of the roster) and `firstMatch` the first one.
- `sections` and `sectionGroups` replace the list of sections and their
 groups. Every section must be in exactly one group.

 */
