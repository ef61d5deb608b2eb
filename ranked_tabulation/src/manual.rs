/*!

This is the long-form manual for `ranked_tabulation` and `rcvtab`.

## Input formats

The following formats are supported by the `rcvtab` command line program:
* `ess` ES&S company (Excel workbook)
* `cdf` NIST common data format (JSON notation)
* `csv` Comma Separated Values

### `ess`

Votes recorded in the ES&S format. Each row is a ballot; the rank choices
start at `firstVoteColumnIndex` and the last column may carry the number of
identical ballots.

### `cdf`

Votes recorded in the Common Data Format from NIST.

Notes:
- only the JSON notation is currently supported (not the XML)
- only one election per report is supported

### `csv`

Simple CSV reader. Each column (in order) is considered to be a choice. The
name of the choice in the header is not significant.

```text
id,count,choice 1,choice 2,choice 3
id1,20,A,B,C
id2,20,A,C,B
```

The `id`, `count` and `precinct` columns are optional and located through
`idColumnIndex`, `countColumnIndex` and `precinctColumnIndex`.

## Configuration

`rcvtab` accepts a configuration file in JSON with four sections:
`outputSettings`, `cvrFileSources`, `candidates` and `rules`.

The rules cover the full tabulation surface of the core:

- `winnerElectionMode`: `singleWinnerMajority`,
  `multiWinnerAllowMultipleWinnersPerRound`,
  `multiWinnerAllowOnlyOneWinnerPerRound`, `bottomsUp`, `multiPassIrv`.
- `continueUntilTwoCandidatesRemain` (boolean): with
  `singleWinnerMajority`, keep eliminating down to a final pair before
  declaring the winner.
- `tiebreakMode`: `random`, `previousRoundCountsThenRandom`,
  `usePermutationInConfig`, `generatePermutation`, `interactive`,
  `stopCountingAndAsk`. The random modes require `randomSeed`; the
  interactive modes prompt on the terminal.
- `overvoteRule`: `exhaustImmediately`, `alwaysSkipToNextRank`,
  `exhaustIfMultipleContinuing`.
- `maxSkippedRanksAllowed` (number or `"unlimited"`),
  `maxRankingsAllowed` (number or `"max"`),
  `exhaustOnDuplicateCandidate` (boolean).
- `numberOfWinners`, `minimumVoteThreshold`, `batchElimination`,
  `hareQuota`, `nonIntegerWinningThreshold`,
  `decimalPlacesForVoteArithmetic` (1 to 20, default 4).

Per ballot source, the labels `overvoteLabel`, `undervoteLabel`,
`undeclaredWriteInLabel`, the flag `treatBlankAsUndeclaredWriteIn` and the
`overvoteDelimiter` control how raw marks are read. A mark for an undeclared
name is only accepted when one of the sources enables undeclared write-ins;
otherwise the tabulation is rejected with the list of unrecognized names.

## Output

The summary is a JSON document with the contest header, one entry per round
(tallies, eliminations, elections and vote transfers) and the winners in
election order. The full machine-readable round record, including exhaustion
split by reason, the truncation residual and every tie-break decision, is
available through the library as a serializable structure.

*/
